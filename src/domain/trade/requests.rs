//! Trade request types.
//!
//! Each request carries its required fields as constructor arguments and its
//! optional fields as `with_*` setters. Rendering to wire parameters goes
//! through [`ToWireMap`], so absent optional fields are never sent.

use rust_decimal::Decimal;

use crate::shared::enums::{
    AlgoPriceType, DebtType, InstrumentType, MarginMode, OrderCategory, OrderSide, OrderState,
    OrderType, PositionSide, QuantityType, Quarter, QuickMarginType, SelfTradePreventionMode,
    TradeMode,
};
use crate::shared::error::{WireError, WireResult};
use crate::shared::pagination::PaginationCursor;
use crate::shared::wire::{ToWireMap, Token, WireMap};

// ============================================================================
// Order entry
// ============================================================================

/// Place a single order.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceOrderRequest {
    pub inst_id: String,
    pub td_mode: TradeMode,
    pub side: OrderSide,
    pub ord_type: OrderType,
    pub sz: Decimal,
    pub pos_side: Option<PositionSide>,
    pub px: Option<Decimal>,
    pub ccy: Option<String>,
    pub cl_ord_id: Option<String>,
    pub reduce_only: Option<bool>,
    pub tgt_ccy: Option<QuantityType>,
    pub quick_mgn_type: Option<QuickMarginType>,
    pub ban_amend: Option<bool>,
    pub tp_trigger_px_type: Option<AlgoPriceType>,
    pub tp_trigger_px: Option<Decimal>,
    pub tp_ord_px: Option<Decimal>,
    pub sl_trigger_px_type: Option<AlgoPriceType>,
    pub sl_trigger_px: Option<Decimal>,
    pub sl_ord_px: Option<Decimal>,
    pub attach_algo_cl_ord_id: Option<String>,
    pub stp_id: Option<String>,
    pub stp_mode: Option<SelfTradePreventionMode>,
}

impl PlaceOrderRequest {
    pub fn new(
        inst_id: impl Into<String>,
        td_mode: TradeMode,
        side: OrderSide,
        ord_type: OrderType,
        sz: Decimal,
    ) -> Self {
        Self {
            inst_id: inst_id.into(),
            td_mode,
            side,
            ord_type,
            sz,
            pos_side: None,
            px: None,
            ccy: None,
            cl_ord_id: None,
            reduce_only: None,
            tgt_ccy: None,
            quick_mgn_type: None,
            ban_amend: None,
            tp_trigger_px_type: None,
            tp_trigger_px: None,
            tp_ord_px: None,
            sl_trigger_px_type: None,
            sl_trigger_px: None,
            sl_ord_px: None,
            attach_algo_cl_ord_id: None,
            stp_id: None,
            stp_mode: None,
        }
    }

    /// Limit price. Required for every order type except market.
    pub fn with_price(mut self, px: Decimal) -> Self {
        self.px = Some(px);
        self
    }

    /// Position side, required in long/short position mode.
    pub fn with_position_side(mut self, pos_side: PositionSide) -> Self {
        self.pos_side = Some(pos_side);
        self
    }

    /// Margin currency for cross-margined MARGIN orders.
    pub fn with_currency(mut self, ccy: impl Into<String>) -> Self {
        self.ccy = Some(ccy.into());
        self
    }

    pub fn with_client_order_id(mut self, cl_ord_id: impl Into<String>) -> Self {
        self.cl_ord_id = Some(cl_ord_id.into());
        self
    }

    pub fn with_reduce_only(mut self, reduce_only: bool) -> Self {
        self.reduce_only = Some(reduce_only);
        self
    }

    /// Unit of `sz` for SPOT market orders.
    pub fn with_target_currency(mut self, tgt_ccy: QuantityType) -> Self {
        self.tgt_ccy = Some(tgt_ccy);
        self
    }

    pub fn with_quick_margin_type(mut self, quick_mgn_type: QuickMarginType) -> Self {
        self.quick_mgn_type = Some(quick_mgn_type);
        self
    }

    /// Reject instead of resizing SPOT market orders the account cannot fund.
    pub fn with_ban_amend(mut self, ban_amend: bool) -> Self {
        self.ban_amend = Some(ban_amend);
        self
    }

    /// Attach a take-profit. An order price of `-1` executes at market.
    pub fn with_take_profit(
        mut self,
        trigger_px: Decimal,
        ord_px: Decimal,
        trigger_px_type: Option<AlgoPriceType>,
    ) -> Self {
        self.tp_trigger_px = Some(trigger_px);
        self.tp_ord_px = Some(ord_px);
        self.tp_trigger_px_type = trigger_px_type;
        self
    }

    /// Attach a stop-loss. An order price of `-1` executes at market.
    pub fn with_stop_loss(
        mut self,
        trigger_px: Decimal,
        ord_px: Decimal,
        trigger_px_type: Option<AlgoPriceType>,
    ) -> Self {
        self.sl_trigger_px = Some(trigger_px);
        self.sl_ord_px = Some(ord_px);
        self.sl_trigger_px_type = trigger_px_type;
        self
    }

    pub fn with_attached_algo_client_id(mut self, id: impl Into<String>) -> Self {
        self.attach_algo_cl_ord_id = Some(id.into());
        self
    }

    pub fn with_self_trade_prevention(
        mut self,
        stp_id: Option<String>,
        stp_mode: SelfTradePreventionMode,
    ) -> Self {
        self.stp_id = stp_id;
        self.stp_mode = Some(stp_mode);
        self
    }
}

impl ToWireMap for PlaceOrderRequest {
    fn to_wire_map(&self) -> WireResult<WireMap> {
        WireMap::new()
            .required("instId", &self.inst_id)?
            .required_enum("tdMode", self.td_mode)?
            .required_enum("side", self.side)?
            .optional_enum("posSide", self.pos_side)?
            .required_enum("ordType", self.ord_type)?
            .required("sz", &self.sz)?
            .optional("px", self.px.as_ref())?
            .optional("ccy", self.ccy.as_ref())?
            .optional("clOrdId", self.cl_ord_id.as_ref())?
            .optional("reduceOnly", self.reduce_only.as_ref())?
            .optional_enum("tgtCcy", self.tgt_ccy)?
            .optional_enum("quickMgnType", self.quick_mgn_type)?
            .optional("banAmend", self.ban_amend.as_ref())?
            .optional_enum("tpTriggerPxType", self.tp_trigger_px_type)?
            .optional("tpTriggerPx", self.tp_trigger_px.as_ref())?
            .optional("tpOrdPx", self.tp_ord_px.as_ref())?
            .optional_enum("slTriggerPxType", self.sl_trigger_px_type)?
            .optional("slTriggerPx", self.sl_trigger_px.as_ref())?
            .optional("slOrdPx", self.sl_ord_px.as_ref())?
            .optional("attachAlgoClOrdId", self.attach_algo_cl_ord_id.as_ref())?
            .optional("stpId", self.stp_id.as_ref())?
            .optional_enum("stpMode", self.stp_mode)
    }
}

/// Identifies one order by exchange ID or client ID.
///
/// Used to query and to cancel. At least one of the IDs is required; when
/// both are set the exchange uses `ordId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRef {
    pub inst_id: String,
    pub ord_id: Option<String>,
    pub cl_ord_id: Option<String>,
}

impl OrderRef {
    pub fn by_order_id(inst_id: impl Into<String>, ord_id: impl Into<String>) -> Self {
        Self {
            inst_id: inst_id.into(),
            ord_id: Some(ord_id.into()),
            cl_ord_id: None,
        }
    }

    pub fn by_client_order_id(inst_id: impl Into<String>, cl_ord_id: impl Into<String>) -> Self {
        Self {
            inst_id: inst_id.into(),
            ord_id: None,
            cl_ord_id: Some(cl_ord_id.into()),
        }
    }
}

impl ToWireMap for OrderRef {
    fn to_wire_map(&self) -> WireResult<WireMap> {
        WireMap::new()
            .required("instId", &self.inst_id)?
            .optional("ordId", self.ord_id.as_ref())?
            .optional("clOrdId", self.cl_ord_id.as_ref())?
            .require_any(&["ordId", "clOrdId"], "ordId|clOrdId")
    }
}

/// Amend an incomplete order.
#[derive(Debug, Clone, PartialEq)]
pub struct AmendOrderRequest {
    pub order: OrderRef,
    pub cxl_on_fail: Option<bool>,
    pub req_id: Option<String>,
    pub new_sz: Option<Decimal>,
    pub new_px: Option<Decimal>,
    pub new_tp_trigger_px_type: Option<AlgoPriceType>,
    pub new_tp_trigger_px: Option<Decimal>,
    pub new_tp_ord_px: Option<Decimal>,
    pub new_sl_trigger_px_type: Option<AlgoPriceType>,
    pub new_sl_trigger_px: Option<Decimal>,
    pub new_sl_ord_px: Option<Decimal>,
}

impl AmendOrderRequest {
    pub fn new(order: OrderRef) -> Self {
        Self {
            order,
            cxl_on_fail: None,
            req_id: None,
            new_sz: None,
            new_px: None,
            new_tp_trigger_px_type: None,
            new_tp_trigger_px: None,
            new_tp_ord_px: None,
            new_sl_trigger_px_type: None,
            new_sl_trigger_px: None,
            new_sl_ord_px: None,
        }
    }

    /// Cancel the order if the amendment fails.
    pub fn with_cancel_on_fail(mut self, cxl_on_fail: bool) -> Self {
        self.cxl_on_fail = Some(cxl_on_fail);
        self
    }

    /// Client-supplied ID echoed back in the reply.
    pub fn with_request_id(mut self, req_id: impl Into<String>) -> Self {
        self.req_id = Some(req_id.into());
        self
    }

    /// New total size, including any filled quantity.
    pub fn with_size(mut self, new_sz: Decimal) -> Self {
        self.new_sz = Some(new_sz);
        self
    }

    pub fn with_price(mut self, new_px: Decimal) -> Self {
        self.new_px = Some(new_px);
        self
    }

    pub fn with_take_profit(
        mut self,
        trigger_px: Decimal,
        ord_px: Decimal,
        trigger_px_type: Option<AlgoPriceType>,
    ) -> Self {
        self.new_tp_trigger_px = Some(trigger_px);
        self.new_tp_ord_px = Some(ord_px);
        self.new_tp_trigger_px_type = trigger_px_type;
        self
    }

    pub fn with_stop_loss(
        mut self,
        trigger_px: Decimal,
        ord_px: Decimal,
        trigger_px_type: Option<AlgoPriceType>,
    ) -> Self {
        self.new_sl_trigger_px = Some(trigger_px);
        self.new_sl_ord_px = Some(ord_px);
        self.new_sl_trigger_px_type = trigger_px_type;
        self
    }
}

impl ToWireMap for AmendOrderRequest {
    fn to_wire_map(&self) -> WireResult<WireMap> {
        self.order
            .to_wire_map()?
            .optional("cxlOnFail", self.cxl_on_fail.as_ref())?
            .optional("reqId", self.req_id.as_ref())?
            .optional("newSz", self.new_sz.as_ref())?
            .optional("newPx", self.new_px.as_ref())?
            .optional_enum("newTpTriggerPxType", self.new_tp_trigger_px_type)?
            .optional("newTpTriggerPx", self.new_tp_trigger_px.as_ref())?
            .optional("newTpOrdPx", self.new_tp_ord_px.as_ref())?
            .optional_enum("newSlTriggerPxType", self.new_sl_trigger_px_type)?
            .optional("newSlTriggerPx", self.new_sl_trigger_px.as_ref())?
            .optional("newSlOrdPx", self.new_sl_ord_px.as_ref())
    }
}

/// Close a position at market.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosePositionRequest {
    pub inst_id: String,
    pub mgn_mode: MarginMode,
    pub pos_side: Option<PositionSide>,
    pub ccy: Option<String>,
    pub auto_cxl: Option<bool>,
    pub cl_ord_id: Option<String>,
}

impl ClosePositionRequest {
    pub fn new(inst_id: impl Into<String>, mgn_mode: MarginMode) -> Self {
        Self {
            inst_id: inst_id.into(),
            mgn_mode,
            pos_side: None,
            ccy: None,
            auto_cxl: None,
            cl_ord_id: None,
        }
    }

    pub fn with_position_side(mut self, pos_side: PositionSide) -> Self {
        self.pos_side = Some(pos_side);
        self
    }

    pub fn with_currency(mut self, ccy: impl Into<String>) -> Self {
        self.ccy = Some(ccy.into());
        self
    }

    /// Cancel pending orders that block the close.
    pub fn with_auto_cancel(mut self, auto_cxl: bool) -> Self {
        self.auto_cxl = Some(auto_cxl);
        self
    }

    pub fn with_client_order_id(mut self, cl_ord_id: impl Into<String>) -> Self {
        self.cl_ord_id = Some(cl_ord_id.into());
        self
    }
}

impl ToWireMap for ClosePositionRequest {
    fn to_wire_map(&self) -> WireResult<WireMap> {
        WireMap::new()
            .required("instId", &self.inst_id)?
            .required_enum("mgnMode", self.mgn_mode)?
            .optional_enum("posSide", self.pos_side)?
            .optional("ccy", self.ccy.as_ref())?
            .optional("autoCxl", self.auto_cxl.as_ref())?
            .optional("clOrdId", self.cl_ord_id.as_ref())
    }
}

/// Cancel every MMP order of an instrument family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MassCancelRequest {
    pub inst_type: InstrumentType,
    pub inst_family: String,
}

impl MassCancelRequest {
    pub fn new(inst_type: InstrumentType, inst_family: impl Into<String>) -> Self {
        Self {
            inst_type,
            inst_family: inst_family.into(),
        }
    }
}

impl ToWireMap for MassCancelRequest {
    fn to_wire_map(&self) -> WireResult<WireMap> {
        WireMap::new()
            .required_enum("instType", self.inst_type)?
            .required("instFamily", &self.inst_family)
    }
}

// ============================================================================
// Queries
// ============================================================================

/// Filters for the open-orders list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenOrdersQuery {
    pub inst_type: Option<InstrumentType>,
    pub uly: Option<String>,
    pub inst_family: Option<String>,
    pub inst_id: Option<String>,
    pub ord_type: Option<OrderType>,
    pub state: Option<OrderState>,
    pub cursor: PaginationCursor,
}

impl OpenOrdersQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instrument_type(mut self, inst_type: InstrumentType) -> Self {
        self.inst_type = Some(inst_type);
        self
    }

    pub fn with_underlying(mut self, uly: impl Into<String>) -> Self {
        self.uly = Some(uly.into());
        self
    }

    pub fn with_instrument_family(mut self, inst_family: impl Into<String>) -> Self {
        self.inst_family = Some(inst_family.into());
        self
    }

    pub fn with_instrument(mut self, inst_id: impl Into<String>) -> Self {
        self.inst_id = Some(inst_id.into());
        self
    }

    pub fn with_order_type(mut self, ord_type: OrderType) -> Self {
        self.ord_type = Some(ord_type);
        self
    }

    pub fn with_state(mut self, state: OrderState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_cursor(mut self, cursor: PaginationCursor) -> Self {
        self.cursor = cursor;
        self
    }
}

impl ToWireMap for OpenOrdersQuery {
    fn to_wire_map(&self) -> WireResult<WireMap> {
        let map = WireMap::new()
            .optional_enum("instType", self.inst_type)?
            .optional("uly", self.uly.as_ref())?
            .optional("instFamily", self.inst_family.as_ref())?
            .optional("instId", self.inst_id.as_ref())?
            .optional_enum("ordType", self.ord_type)?
            .optional_enum("state", self.state)?;
        self.cursor.write_to(map)
    }
}

/// Filters for order history (last 7 days) and the order archive (3 months).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderHistoryQuery {
    pub inst_type: InstrumentType,
    pub uly: Option<String>,
    pub inst_family: Option<String>,
    pub inst_id: Option<String>,
    pub ord_type: Option<OrderType>,
    pub state: Option<OrderState>,
    pub category: Option<OrderCategory>,
    /// Unix milliseconds
    pub begin: Option<i64>,
    /// Unix milliseconds
    pub end: Option<i64>,
    pub cursor: PaginationCursor,
}

impl OrderHistoryQuery {
    pub fn new(inst_type: InstrumentType) -> Self {
        Self {
            inst_type,
            uly: None,
            inst_family: None,
            inst_id: None,
            ord_type: None,
            state: None,
            category: None,
            begin: None,
            end: None,
            cursor: PaginationCursor::default(),
        }
    }

    pub fn with_underlying(mut self, uly: impl Into<String>) -> Self {
        self.uly = Some(uly.into());
        self
    }

    pub fn with_instrument_family(mut self, inst_family: impl Into<String>) -> Self {
        self.inst_family = Some(inst_family.into());
        self
    }

    pub fn with_instrument(mut self, inst_id: impl Into<String>) -> Self {
        self.inst_id = Some(inst_id.into());
        self
    }

    pub fn with_order_type(mut self, ord_type: OrderType) -> Self {
        self.ord_type = Some(ord_type);
        self
    }

    pub fn with_state(mut self, state: OrderState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_category(mut self, category: OrderCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Restrict to orders created in `[begin, end]`, Unix milliseconds.
    pub fn with_time_range(mut self, begin: Option<i64>, end: Option<i64>) -> Self {
        self.begin = begin;
        self.end = end;
        self
    }

    pub fn with_cursor(mut self, cursor: PaginationCursor) -> Self {
        self.cursor = cursor;
        self
    }
}

impl ToWireMap for OrderHistoryQuery {
    fn to_wire_map(&self) -> WireResult<WireMap> {
        let map = WireMap::new()
            .required_enum("instType", self.inst_type)?
            .optional("uly", self.uly.as_ref())?
            .optional("instFamily", self.inst_family.as_ref())?
            .optional("instId", self.inst_id.as_ref())?
            .optional_enum("ordType", self.ord_type)?
            .optional_enum("state", self.state)?
            .optional_enum("category", self.category)?
            .optional("begin", self.begin.as_ref())?
            .optional("end", self.end.as_ref())?;
        self.cursor.write_to(map)
    }
}

/// Filters for fills (last 3 days) and fills history (3 months).
///
/// `inst_type` is optional for recent fills and required for fills history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillsQuery {
    pub inst_type: Option<InstrumentType>,
    pub uly: Option<String>,
    pub inst_family: Option<String>,
    pub inst_id: Option<String>,
    pub ord_id: Option<String>,
    /// Unix milliseconds
    pub begin: Option<i64>,
    /// Unix milliseconds
    pub end: Option<i64>,
    pub cursor: PaginationCursor,
}

impl FillsQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instrument_type(mut self, inst_type: InstrumentType) -> Self {
        self.inst_type = Some(inst_type);
        self
    }

    pub fn with_underlying(mut self, uly: impl Into<String>) -> Self {
        self.uly = Some(uly.into());
        self
    }

    pub fn with_instrument_family(mut self, inst_family: impl Into<String>) -> Self {
        self.inst_family = Some(inst_family.into());
        self
    }

    pub fn with_instrument(mut self, inst_id: impl Into<String>) -> Self {
        self.inst_id = Some(inst_id.into());
        self
    }

    pub fn with_order_id(mut self, ord_id: impl Into<String>) -> Self {
        self.ord_id = Some(ord_id.into());
        self
    }

    pub fn with_time_range(mut self, begin: Option<i64>, end: Option<i64>) -> Self {
        self.begin = begin;
        self.end = end;
        self
    }

    pub fn with_cursor(mut self, cursor: PaginationCursor) -> Self {
        self.cursor = cursor;
        self
    }

    /// Render with `instType` as a required field.
    pub(crate) fn to_history_map(&self) -> WireResult<WireMap> {
        let map = WireMap::new().required_opt("instType", self.inst_type.map(Token).as_ref())?;
        self.write_filters(map)
    }

    fn write_filters(&self, map: WireMap) -> WireResult<WireMap> {
        let map = map
            .optional("uly", self.uly.as_ref())?
            .optional("instFamily", self.inst_family.as_ref())?
            .optional("instId", self.inst_id.as_ref())?
            .optional("ordId", self.ord_id.as_ref())?
            .optional("begin", self.begin.as_ref())?
            .optional("end", self.end.as_ref())?;
        self.cursor.write_to(map)
    }
}

impl ToWireMap for FillsQuery {
    fn to_wire_map(&self) -> WireResult<WireMap> {
        let map = WireMap::new().optional_enum("instType", self.inst_type)?;
        self.write_filters(map)
    }
}

/// Fills archive period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchivePeriod {
    pub year: u16,
    pub quarter: Quarter,
}

impl ArchivePeriod {
    pub fn new(year: u16, quarter: Quarter) -> Self {
        Self { year, quarter }
    }
}

impl ToWireMap for ArchivePeriod {
    fn to_wire_map(&self) -> WireResult<WireMap> {
        WireMap::new()
            .required("year", &self.year)?
            .required_enum("quarter", self.quarter)
    }
}

/// Convert small balances into one currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EasyConvertRequest {
    pub from_ccy: Vec<String>,
    pub to_ccy: String,
}

impl EasyConvertRequest {
    pub fn new<I, S>(from_ccy: I, to_ccy: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            from_ccy: from_ccy.into_iter().map(Into::into).collect(),
            to_ccy: to_ccy.into(),
        }
    }
}

impl ToWireMap for EasyConvertRequest {
    fn to_wire_map(&self) -> WireResult<WireMap> {
        if self.from_ccy.is_empty() {
            return Err(WireError::MissingField("fromCcy"));
        }
        WireMap::new()
            .required("fromCcy", &self.from_ccy)?
            .required("toCcy", &self.to_ccy)
    }
}

/// Repay debts in one currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneClickRepayRequest {
    pub debt_ccy: Vec<String>,
    pub repay_ccy: String,
}

impl OneClickRepayRequest {
    pub fn new<I, S>(debt_ccy: I, repay_ccy: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            debt_ccy: debt_ccy.into_iter().map(Into::into).collect(),
            repay_ccy: repay_ccy.into(),
        }
    }
}

impl ToWireMap for OneClickRepayRequest {
    fn to_wire_map(&self) -> WireResult<WireMap> {
        if self.debt_ccy.is_empty() {
            return Err(WireError::MissingField("debtCcy"));
        }
        WireMap::new()
            .required("debtCcy", &self.debt_ccy)?
            .required("repayCcy", &self.repay_ccy)
    }
}

/// Filter for the one-click repay currency list.
pub(crate) fn debt_type_filter(debt_type: Option<DebtType>) -> WireResult<WireMap> {
    WireMap::new().optional_enum("debtType", debt_type)
}
