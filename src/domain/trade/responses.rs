//! Trade response types.
//!
//! Numeric fields arrive as strings and are often `""` when not applicable,
//! so decimals and timestamps decode leniently into `Option`s. Enum fields
//! decode into [`Wire`] and keep tokens this crate does not know yet.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::shared::decimal::lenient;
use crate::shared::enums::{
    opt_wire, AlgoPriceType, DebtType, InstrumentType, OrderCategory, OrderSide, OrderState,
    OrderType, PositionSide, QuantityType, QuickMarginType, SelfTradePreventionMode, TradeMode,
    Wire,
};
use crate::shared::reply::ItemStatus;

/// Acknowledgement for place, cancel and amend operations.
///
/// Batch operations return one per submitted item, in submission order.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderAck {
    #[serde(default)]
    pub ord_id: String,
    #[serde(default)]
    pub cl_ord_id: String,
    #[serde(default)]
    pub tag: String,
    /// Echo of the amend request ID
    #[serde(default)]
    pub req_id: String,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub ts: Option<i64>,
    #[serde(default)]
    pub s_code: String,
    #[serde(default)]
    pub s_msg: String,
}

impl ItemStatus for OrderAck {
    fn s_code(&self) -> &str {
        &self.s_code
    }

    fn s_msg(&self) -> &str {
        &self.s_msg
    }
}

/// Close-position result.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClosePositionReply {
    pub inst_id: String,
    #[serde(default, deserialize_with = "opt_wire")]
    pub pos_side: Option<Wire<PositionSide>>,
    #[serde(default)]
    pub cl_ord_id: String,
    #[serde(default)]
    pub tag: String,
}

/// Order details, as returned by order queries and the `orders` channel.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub inst_type: Wire<InstrumentType>,
    pub inst_id: String,
    pub ord_id: String,
    #[serde(default)]
    pub cl_ord_id: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub ccy: String,
    #[serde(default, deserialize_with = "opt_wire")]
    pub tgt_ccy: Option<Wire<QuantityType>>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub px: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub sz: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub pnl: Option<Decimal>,
    pub ord_type: Wire<OrderType>,
    pub side: Wire<OrderSide>,
    #[serde(default, deserialize_with = "opt_wire")]
    pub pos_side: Option<Wire<PositionSide>>,
    pub td_mode: Wire<TradeMode>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub acc_fill_sz: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub fill_px: Option<Decimal>,
    #[serde(default)]
    pub trade_id: String,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub fill_sz: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub fill_time: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub avg_px: Option<Decimal>,
    pub state: Wire<OrderState>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub lever: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_wire")]
    pub tp_trigger_px_type: Option<Wire<AlgoPriceType>>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub tp_trigger_px: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub tp_ord_px: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_wire")]
    pub sl_trigger_px_type: Option<Wire<AlgoPriceType>>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub sl_trigger_px: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub sl_ord_px: Option<Decimal>,
    #[serde(default)]
    pub stp_id: String,
    #[serde(default, deserialize_with = "opt_wire")]
    pub stp_mode: Option<Wire<SelfTradePreventionMode>>,
    #[serde(default)]
    pub fee_ccy: String,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub fee: Option<Decimal>,
    #[serde(default)]
    pub rebate_ccy: String,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub rebate: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_wire")]
    pub category: Option<Wire<OrderCategory>>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub reduce_only: bool,
    #[serde(default, deserialize_with = "opt_wire")]
    pub quick_mgn_type: Option<Wire<QuickMarginType>>,
    #[serde(default)]
    pub cancel_source: String,
    #[serde(default)]
    pub algo_id: String,
    #[serde(default)]
    pub algo_cl_ord_id: String,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub u_time: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub c_time: Option<i64>,
}

impl Order {
    /// Whether the order can still trade.
    pub fn is_open(&self) -> bool {
        matches!(
            self.state.known(),
            Some(OrderState::Live) | Some(OrderState::PartiallyFilled)
        )
    }
}

/// A fill (transaction detail).
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Fill {
    pub inst_type: Wire<InstrumentType>,
    pub inst_id: String,
    #[serde(default)]
    pub trade_id: String,
    pub ord_id: String,
    #[serde(default)]
    pub cl_ord_id: String,
    #[serde(default)]
    pub bill_id: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub fill_px: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub fill_sz: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub fill_idx_px: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub fill_pnl: Option<Decimal>,
    pub side: Wire<OrderSide>,
    #[serde(default, deserialize_with = "opt_wire")]
    pub pos_side: Option<Wire<PositionSide>>,
    /// `T` taker, `M` maker
    #[serde(default)]
    pub exec_type: String,
    #[serde(default)]
    pub fee_ccy: String,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub fee: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub ts: Option<i64>,
}

/// Reply to a fills-archive application.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveApplied {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub result: bool,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub ts: Option<i64>,
}

/// Download link for a fills archive.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveLink {
    #[serde(default)]
    pub file_href: String,
    /// `finished`, `ongoing` or `failed`
    #[serde(default)]
    pub state: String,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub ts: Option<i64>,
}

/// A currency balance line.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyAmount {
    pub ccy: String,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub amt: Option<Decimal>,
}

/// Currencies eligible for easy convert.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EasyConvertCurrencies {
    #[serde(default)]
    pub from_data: Vec<CurrencyAmount>,
    #[serde(default)]
    pub to_ccy: Vec<String>,
}

/// An easy-convert order, placed or historical.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EasyConvertOrder {
    pub from_ccy: String,
    pub to_ccy: String,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub fill_from_sz: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub fill_to_sz: Option<Decimal>,
    /// `running`, `filled` or `failed`
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub u_time: Option<i64>,
}

/// Debt line of the one-click repay list.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DebtAmount {
    pub debt_ccy: String,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub debt_amt: Option<Decimal>,
}

/// Repay line of the one-click repay list.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RepayAmount {
    pub repay_ccy: String,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub repay_amt: Option<Decimal>,
}

/// Currencies eligible for one-click repay.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OneClickRepayCurrencies {
    #[serde(default)]
    pub debt_data: Vec<DebtAmount>,
    #[serde(default, deserialize_with = "opt_wire")]
    pub debt_type: Option<Wire<DebtType>>,
    #[serde(default)]
    pub repay_data: Vec<RepayAmount>,
}

/// A one-click repay order, placed or historical.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OneClickRepayOrder {
    pub debt_ccy: String,
    pub repay_ccy: String,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub fill_debt_sz: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub fill_repay_sz: Option<Decimal>,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub u_time: Option<i64>,
}

/// Mass-cancel result.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MassCancelReply {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub result: bool,
}

/// Cancel-all-after (dead man's switch) state.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CancelAllAfterReply {
    /// When the countdown fires, `None` once disabled
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub trigger_time: Option<i64>,
    #[serde(default)]
    pub tag: String,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub ts: Option<i64>,
}

/// Sub-account order rate limit.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountRateLimit {
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub fill_ratio: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub main_fill_ratio: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub acc_rate_limit: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub next_acc_rate_limit: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub ts: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn test_order_decodes_empty_strings_as_none() {
        let order: Order = serde_json::from_value(json!({
            "instType": "SPOT",
            "instId": "BTC-USDT",
            "ordId": "312269865356374016",
            "clOrdId": "b1",
            "tag": "",
            "px": "65000",
            "sz": "0.01",
            "ordType": "limit",
            "side": "buy",
            "posSide": "",
            "tdMode": "cash",
            "accFillSz": "0",
            "fillPx": "",
            "avgPx": "",
            "state": "live",
            "tpTriggerPxType": "",
            "category": "normal",
            "reduceOnly": "false",
            "uTime": "1597026383085",
            "cTime": "1597026383085"
        }))
        .unwrap();

        assert_eq!(order.px, Some(Decimal::from_str("65000").unwrap()));
        assert_eq!(order.fill_px, None);
        assert_eq!(order.pos_side, None);
        assert_eq!(order.tp_trigger_px_type, None);
        assert_eq!(order.state.known(), Some(OrderState::Live));
        assert!(order.is_open());
        assert!(!order.reduce_only);
        assert_eq!(order.c_time, Some(1597026383085));
    }

    #[test]
    fn test_order_keeps_unknown_state() {
        let order: Order = serde_json::from_value(json!({
            "instType": "SWAP",
            "instId": "BTC-USDT-SWAP",
            "ordId": "1",
            "ordType": "elp",
            "side": "sell",
            "tdMode": "cross",
            "state": "effective"
        }))
        .unwrap();
        assert_eq!(order.state, Wire::Unrecognized("effective".to_string()));
        assert_eq!(order.ord_type.raw(), "elp");
        assert!(!order.is_open());
    }

    #[test]
    fn test_order_ack_status() {
        let ack: OrderAck = serde_json::from_value(json!({
            "clOrdId": "", "ordId": "", "tag": "",
            "ts": "1695190491421", "sCode": "51008", "sMsg": "Insufficient balance"
        }))
        .unwrap();
        assert!(!ack.is_success());
        assert_eq!(ack.s_msg(), "Insufficient balance");
    }

    #[test]
    fn test_fill_decodes() {
        let fill: Fill = serde_json::from_value(json!({
            "instType": "SPOT", "instId": "BTC-USDT", "tradeId": "123",
            "ordId": "312269865356374016", "billId": "1", "fillPx": "65000.1",
            "fillSz": "0.01", "side": "buy", "posSide": "net", "execType": "M",
            "feeCcy": "BTC", "fee": "-0.00001", "ts": "1597026383085"
        }))
        .unwrap();
        assert_eq!(fill.pos_side, Some(Wire::Known(PositionSide::Net)));
        assert_eq!(fill.fee, Some(Decimal::from_str("-0.00001").unwrap()));
    }

    #[test]
    fn test_cancel_all_after_disabled() {
        let reply: CancelAllAfterReply =
            serde_json::from_value(json!({"triggerTime": "", "tag": "", "ts": "1587971400"}))
                .unwrap();
        assert_eq!(reply.trigger_time, None);
    }
}
