//! Wire-token tables for exchange enumerations.
//!
//! Each enumeration is declared once with [`wire_enum!`], which generates the
//! Rust enum together with its token table. Encoding is total over the
//! declared members. Decoding on the response path is lenient: a token the
//! table does not know becomes [`Wire::Unrecognized`] instead of an error,
//! since the exchange adds values over time.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::shared::error::{WireError, WireResult};

/// A closed enumeration with a fixed wire token per member.
pub trait WireEnum: Copy + Sized + 'static {
    /// Enum name used in error messages.
    const NAME: &'static str;

    /// Every declared member, in declaration order.
    const ALL: &'static [Self];

    /// The wire token for this member.
    fn as_wire(&self) -> &'static str;

    /// Look up a member by wire token.
    fn from_wire(token: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_wire() == token)
    }
}

/// Decoded enum value that tolerates tokens the table does not know.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Wire<T> {
    /// A declared member
    Known(T),
    /// A token not present in the table, kept verbatim
    Unrecognized(String),
}

impl<T: WireEnum> Wire<T> {
    /// Decode a token.
    pub fn decode(token: &str) -> Self {
        match T::from_wire(token) {
            Some(v) => Self::Known(v),
            None => Self::Unrecognized(token.to_string()),
        }
    }

    /// Encode back to a token, failing for unrecognized values.
    pub fn encode(&self) -> WireResult<&str> {
        match self {
            Self::Known(v) => Ok(v.as_wire()),
            Self::Unrecognized(raw) => Err(WireError::UnencodableEnum {
                kind: T::NAME,
                raw: raw.clone(),
            }),
        }
    }

    /// The declared member, if any.
    pub fn known(&self) -> Option<T> {
        match self {
            Self::Known(v) => Some(*v),
            Self::Unrecognized(_) => None,
        }
    }

    /// The raw token as received.
    pub fn raw(&self) -> &str {
        match self {
            Self::Known(v) => v.as_wire(),
            Self::Unrecognized(raw) => raw,
        }
    }
}

impl<T> From<T> for Wire<T> {
    fn from(value: T) -> Self {
        Self::Known(value)
    }
}

impl<T: WireEnum> fmt::Display for Wire<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw())
    }
}

impl<T: WireEnum> Serialize for Wire<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.raw())
    }
}

impl<'de, T: WireEnum> Deserialize<'de> for Wire<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Ok(Self::decode(&token))
    }
}

/// Serde helper: `Option<Wire<T>>` where `""` means "not set".
pub fn opt_wire<'de, D, T>(deserializer: D) -> Result<Option<Wire<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: WireEnum,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(token) if !token.is_empty() => Ok(Some(Wire::decode(&token))),
        _ => Ok(None),
    }
}

/// Declare an enumeration and its wire-token table.
///
/// ```ignore
/// wire_enum! {
///     /// Order side
///     OrderSide {
///         Buy => "buy",
///         Sell => "sell",
///     }
/// }
/// ```
#[macro_export]
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $token:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $crate::shared::enums::WireEnum for $name {
            const NAME: &'static str = stringify!($name);
            const ALL: &'static [Self] = &[$( Self::$variant ),+];

            fn as_wire(&self) -> &'static str {
                match self {
                    $( Self::$variant => $token ),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::shared::enums::WireEnum::as_wire(self))
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str($crate::shared::enums::WireEnum::as_wire(self))
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let token = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                <Self as $crate::shared::enums::WireEnum>::from_wire(&token).ok_or_else(|| {
                    ::serde::de::Error::custom(format!(
                        "unknown {} token '{}'",
                        stringify!($name),
                        token
                    ))
                })
            }
        }
    };
}

// ============================================================================
// Trading
// ============================================================================

wire_enum! {
    /// Instrument type
    InstrumentType {
        Spot => "SPOT",
        Margin => "MARGIN",
        Swap => "SWAP",
        Futures => "FUTURES",
        Option => "OPTION",
        Any => "ANY",
    }
}

wire_enum! {
    /// Order side
    OrderSide {
        Buy => "buy",
        Sell => "sell",
    }
}

wire_enum! {
    /// Position side
    PositionSide {
        Net => "net",
        Long => "long",
        Short => "short",
    }
}

wire_enum! {
    /// Order type
    OrderType {
        Market => "market",
        Limit => "limit",
        PostOnly => "post_only",
        FillOrKill => "fok",
        ImmediateOrCancel => "ioc",
        OptimalLimitIoc => "optimal_limit_ioc",
        Mmp => "mmp",
        MmpAndPostOnly => "mmp_and_post_only",
    }
}

wire_enum! {
    /// Trade mode (`tdMode`)
    TradeMode {
        Cross => "cross",
        Isolated => "isolated",
        Cash => "cash",
        SpotIsolated => "spot_isolated",
    }
}

wire_enum! {
    /// Margin mode (`mgnMode`)
    MarginMode {
        Cross => "cross",
        Isolated => "isolated",
    }
}

wire_enum! {
    /// Unit of `sz` for spot market orders (`tgtCcy`)
    QuantityType {
        BaseCurrency => "base_ccy",
        QuoteCurrency => "quote_ccy",
    }
}

wire_enum! {
    /// Quick margin borrowing mode
    QuickMarginType {
        Manual => "manual",
        AutoBorrow => "auto_borrow",
        AutoRepay => "auto_repay",
    }
}

wire_enum! {
    /// Price source for TP/SL triggers
    AlgoPriceType {
        Last => "last",
        Index => "index",
        Mark => "mark",
    }
}

wire_enum! {
    /// Self-trade prevention mode
    SelfTradePreventionMode {
        CancelMaker => "cancel_maker",
        CancelTaker => "cancel_taker",
        CancelBoth => "cancel_both",
    }
}

wire_enum! {
    /// Order state
    OrderState {
        Canceled => "canceled",
        Live => "live",
        PartiallyFilled => "partially_filled",
        Filled => "filled",
        MmpCanceled => "mmp_canceled",
    }
}

wire_enum! {
    /// Order category
    OrderCategory {
        Normal => "normal",
        Twap => "twap",
        Adl => "adl",
        FullLiquidation => "full_liquidation",
        PartialLiquidation => "partial_liquidation",
        Delivery => "delivery",
        Ddh => "ddh",
        AutoConversion => "auto_conversion",
    }
}

wire_enum! {
    /// Calendar quarter for archived fills
    Quarter {
        Q1 => "Q1",
        Q2 => "Q2",
        Q3 => "Q3",
        Q4 => "Q4",
    }
}

wire_enum! {
    /// Debt type for one-click repay
    DebtType {
        Cross => "cross",
        Isolated => "isolated",
    }
}

// ============================================================================
// Grid trading
// ============================================================================

wire_enum! {
    /// Grid algo order type
    GridAlgoOrderType {
        SpotGrid => "grid",
        ContractGrid => "contract_grid",
    }
}

wire_enum! {
    /// Grid spacing
    GridRunType {
        Arithmetic => "1",
        Geometric => "2",
    }
}

wire_enum! {
    /// Contract grid direction
    GridContractDirection {
        Long => "long",
        Short => "short",
        Neutral => "neutral",
    }
}

wire_enum! {
    /// What to do with the base currency when a spot grid stops
    GridSpotStopType {
        SellBase => "1",
        KeepBase => "2",
    }
}

wire_enum! {
    /// What to do with positions when a contract grid stops
    GridContractStopType {
        MarketCloseAll => "1",
        KeepPositions => "2",
    }
}

wire_enum! {
    /// Grid sub-order filter
    GridSubOrderType {
        Live => "live",
        Filled => "filled",
    }
}

wire_enum! {
    /// Grid algo order state
    GridAlgoState {
        Starting => "starting",
        Running => "running",
        Stopping => "stopping",
        PendingSignal => "pending_signal",
        NoClosePosition => "no_close_position",
        Stopped => "stopped",
    }
}

wire_enum! {
    /// Margin adjustment direction
    MarginAddReduce {
        Add => "add",
        Reduce => "reduce",
    }
}

wire_enum! {
    /// Grid trigger action
    GridTriggerAction {
        Start => "start",
        Stop => "stop",
    }
}

wire_enum! {
    /// Grid trigger strategy
    GridTriggerStrategy {
        Instant => "instant",
        Price => "price",
        Rsi => "rsi",
    }
}

wire_enum! {
    /// RSI trigger condition
    GridTriggerCondition {
        CrossUp => "cross_up",
        CrossDown => "cross_down",
        Above => "above",
        Below => "below",
        Cross => "cross",
    }
}

wire_enum! {
    /// Back-testing window for AI grid parameters
    GridBacktestDuration {
        SevenDays => "7D",
        ThirtyDays => "30D",
        OneHundredEightyDays => "180D",
    }
}

wire_enum! {
    /// K-line timeframe for RSI triggers
    Timeframe {
        ThreeMinutes => "3m",
        FiveMinutes => "5m",
        FifteenMinutes => "15m",
        ThirtyMinutes => "30m",
        OneHour => "1H",
        FourHours => "4H",
        OneDay => "1D",
    }
}
