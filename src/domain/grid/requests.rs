//! Grid trading request types.

use rust_decimal::Decimal;

use crate::shared::enums::{
    GridAlgoOrderType, GridBacktestDuration, GridContractDirection, GridContractStopType,
    GridRunType, GridSpotStopType, GridSubOrderType, GridTriggerAction, GridTriggerCondition,
    GridTriggerStrategy, InstrumentType, MarginAddReduce, Timeframe, WireEnum,
};
use crate::shared::error::WireResult;
use crate::shared::pagination::PaginationCursor;
use crate::shared::wire::{ToWire, ToWireMap, WireMap, WireValue};

/// RSI back-testing window sent when the caller does not pick one.
pub const DEFAULT_RSI_DURATION: &str = "1M";

/// Stop behaviour, which depends on the grid kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridStopType {
    Spot(GridSpotStopType),
    Contract(GridContractStopType),
}

impl GridStopType {
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Spot(t) => t.as_wire(),
            Self::Contract(t) => t.as_wire(),
        }
    }
}

impl ToWire for GridStopType {
    fn to_wire(&self) -> WireResult<WireValue> {
        Ok(WireValue::Str(self.as_wire().to_string()))
    }
}

// ============================================================================
// Triggers
// ============================================================================

/// Start or stop condition of a grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridTriggerParams {
    pub trigger_action: GridTriggerAction,
    pub trigger_strategy: GridTriggerStrategy,
    pub delay_seconds: Option<u32>,
    pub timeframe: Option<Timeframe>,
    pub thold: Option<Decimal>,
    pub trigger_cond: Option<GridTriggerCondition>,
    pub time_period: Option<u32>,
    pub trigger_px: Option<Decimal>,
    pub stop_type: Option<GridStopType>,
}

impl GridTriggerParams {
    pub fn new(trigger_action: GridTriggerAction, trigger_strategy: GridTriggerStrategy) -> Self {
        Self {
            trigger_action,
            trigger_strategy,
            delay_seconds: None,
            timeframe: None,
            thold: None,
            trigger_cond: None,
            time_period: None,
            trigger_px: None,
            stop_type: None,
        }
    }

    /// Fire when the price crosses `trigger_px`.
    pub fn price(trigger_action: GridTriggerAction, trigger_px: Decimal) -> Self {
        Self::new(trigger_action, GridTriggerStrategy::Price).with_trigger_price(trigger_px)
    }

    /// Fire on an RSI condition.
    pub fn rsi(
        trigger_action: GridTriggerAction,
        timeframe: Timeframe,
        thold: Decimal,
        trigger_cond: GridTriggerCondition,
    ) -> Self {
        let mut params = Self::new(trigger_action, GridTriggerStrategy::Rsi);
        params.timeframe = Some(timeframe);
        params.thold = Some(thold);
        params.trigger_cond = Some(trigger_cond);
        params
    }

    pub fn with_delay_seconds(mut self, delay_seconds: u32) -> Self {
        self.delay_seconds = Some(delay_seconds);
        self
    }

    pub fn with_time_period(mut self, time_period: u32) -> Self {
        self.time_period = Some(time_period);
        self
    }

    pub fn with_trigger_price(mut self, trigger_px: Decimal) -> Self {
        self.trigger_px = Some(trigger_px);
        self
    }

    /// Only meaningful for a stop trigger.
    pub fn with_stop_type(mut self, stop_type: GridStopType) -> Self {
        self.stop_type = Some(stop_type);
        self
    }
}

impl ToWireMap for GridTriggerParams {
    fn to_wire_map(&self) -> WireResult<WireMap> {
        WireMap::new()
            .required_enum("triggerAction", self.trigger_action)?
            .required_enum("triggerStrategy", self.trigger_strategy)?
            .optional("delaySeconds", self.delay_seconds.as_ref())?
            .optional_enum("timeframe", self.timeframe)?
            .optional("thold", self.thold.as_ref())?
            .optional_enum("triggerCond", self.trigger_cond)?
            .optional("timePeriod", self.time_period.as_ref())?
            .optional("triggerPx", self.trigger_px.as_ref())?
            .optional("stopType", self.stop_type.as_ref())
    }
}

// ============================================================================
// Order entry
// ============================================================================

/// Place a spot or contract grid.
///
/// Spot grids need `quote_sz` or `base_sz`; contract grids need `sz`,
/// `direction` and `lever`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceGridOrderRequest {
    pub inst_id: String,
    pub algo_ord_type: GridAlgoOrderType,
    pub max_px: Decimal,
    pub min_px: Decimal,
    pub grid_num: u32,
    pub run_type: Option<GridRunType>,
    pub tp_trigger_px: Option<Decimal>,
    pub sl_trigger_px: Option<Decimal>,
    pub algo_cl_ord_id: Option<String>,
    pub trigger_params: Option<Vec<GridTriggerParams>>,
    pub quote_sz: Option<Decimal>,
    pub base_sz: Option<Decimal>,
    pub sz: Option<Decimal>,
    pub direction: Option<GridContractDirection>,
    pub lever: Option<Decimal>,
    pub base_pos: Option<bool>,
}

impl PlaceGridOrderRequest {
    pub fn new(
        inst_id: impl Into<String>,
        algo_ord_type: GridAlgoOrderType,
        max_px: Decimal,
        min_px: Decimal,
        grid_num: u32,
    ) -> Self {
        Self {
            inst_id: inst_id.into(),
            algo_ord_type,
            max_px,
            min_px,
            grid_num,
            run_type: None,
            tp_trigger_px: None,
            sl_trigger_px: None,
            algo_cl_ord_id: None,
            trigger_params: None,
            quote_sz: None,
            base_sz: None,
            sz: None,
            direction: None,
            lever: None,
            base_pos: None,
        }
    }

    /// Spot grid investing `quote_sz` of the quote currency.
    pub fn spot_with_quote(
        inst_id: impl Into<String>,
        max_px: Decimal,
        min_px: Decimal,
        grid_num: u32,
        quote_sz: Decimal,
    ) -> Self {
        let mut request = Self::new(inst_id, GridAlgoOrderType::SpotGrid, max_px, min_px, grid_num);
        request.quote_sz = Some(quote_sz);
        request
    }

    /// Contract grid with `sz` of margin.
    pub fn contract(
        inst_id: impl Into<String>,
        max_px: Decimal,
        min_px: Decimal,
        grid_num: u32,
        direction: GridContractDirection,
        lever: Decimal,
        sz: Decimal,
    ) -> Self {
        let mut request = Self::new(
            inst_id,
            GridAlgoOrderType::ContractGrid,
            max_px,
            min_px,
            grid_num,
        );
        request.direction = Some(direction);
        request.lever = Some(lever);
        request.sz = Some(sz);
        request
    }

    pub fn with_run_type(mut self, run_type: GridRunType) -> Self {
        self.run_type = Some(run_type);
        self
    }

    pub fn with_take_profit(mut self, tp_trigger_px: Decimal) -> Self {
        self.tp_trigger_px = Some(tp_trigger_px);
        self
    }

    pub fn with_stop_loss(mut self, sl_trigger_px: Decimal) -> Self {
        self.sl_trigger_px = Some(sl_trigger_px);
        self
    }

    pub fn with_algo_client_order_id(mut self, algo_cl_ord_id: impl Into<String>) -> Self {
        self.algo_cl_ord_id = Some(algo_cl_ord_id.into());
        self
    }

    pub fn with_trigger(mut self, trigger: GridTriggerParams) -> Self {
        self.trigger_params.get_or_insert_with(Vec::new).push(trigger);
        self
    }

    pub fn with_quote_size(mut self, quote_sz: Decimal) -> Self {
        self.quote_sz = Some(quote_sz);
        self
    }

    pub fn with_base_size(mut self, base_sz: Decimal) -> Self {
        self.base_sz = Some(base_sz);
        self
    }

    /// Open a position when the grid starts. Omit for neutral contract grids.
    pub fn with_base_position(mut self, base_pos: bool) -> Self {
        self.base_pos = Some(base_pos);
        self
    }
}

impl ToWireMap for PlaceGridOrderRequest {
    fn to_wire_map(&self) -> WireResult<WireMap> {
        WireMap::new()
            .required("instId", &self.inst_id)?
            .required_enum("algoOrdType", self.algo_ord_type)?
            .required("maxPx", &self.max_px)?
            .required("minPx", &self.min_px)?
            .required("gridNum", &self.grid_num)?
            .optional_enum("runType", self.run_type)?
            .optional("tpTriggerPx", self.tp_trigger_px.as_ref())?
            .optional("slTriggerPx", self.sl_trigger_px.as_ref())?
            .optional("algoClOrdId", self.algo_cl_ord_id.as_ref())?
            .optional_maps("triggerParams", self.trigger_params.as_deref())?
            .optional("quoteSz", self.quote_sz.as_ref())?
            .optional("baseSz", self.base_sz.as_ref())?
            .optional("sz", self.sz.as_ref())?
            .optional_enum("direction", self.direction)?
            .optional("lever", self.lever.as_ref())?
            .optional("basePos", self.base_pos.as_ref())
    }
}

/// Amend the TP/SL or triggers of a running grid.
#[derive(Debug, Clone, PartialEq)]
pub struct AmendGridOrderRequest {
    pub algo_id: String,
    pub inst_id: String,
    pub sl_trigger_px: Option<Decimal>,
    pub tp_trigger_px: Option<Decimal>,
    pub trigger_params: Option<Vec<GridTriggerParams>>,
}

impl AmendGridOrderRequest {
    pub fn new(algo_id: impl Into<String>, inst_id: impl Into<String>) -> Self {
        Self {
            algo_id: algo_id.into(),
            inst_id: inst_id.into(),
            sl_trigger_px: None,
            tp_trigger_px: None,
            trigger_params: None,
        }
    }

    pub fn with_stop_loss(mut self, sl_trigger_px: Decimal) -> Self {
        self.sl_trigger_px = Some(sl_trigger_px);
        self
    }

    pub fn with_take_profit(mut self, tp_trigger_px: Decimal) -> Self {
        self.tp_trigger_px = Some(tp_trigger_px);
        self
    }

    pub fn with_trigger(mut self, trigger: GridTriggerParams) -> Self {
        self.trigger_params.get_or_insert_with(Vec::new).push(trigger);
        self
    }
}

impl ToWireMap for AmendGridOrderRequest {
    fn to_wire_map(&self) -> WireResult<WireMap> {
        WireMap::new()
            .required("algoId", &self.algo_id)?
            .required("instId", &self.inst_id)?
            .optional("slTriggerPx", self.sl_trigger_px.as_ref())?
            .optional("tpTriggerPx", self.tp_trigger_px.as_ref())?
            .optional_maps("triggerParams", self.trigger_params.as_deref())
    }
}

/// One grid to stop. Sent as an item of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopGridOrderRequest {
    pub algo_id: String,
    pub inst_id: String,
    pub algo_ord_type: GridAlgoOrderType,
    pub stop_type: Option<GridStopType>,
}

impl StopGridOrderRequest {
    pub fn new(
        algo_id: impl Into<String>,
        inst_id: impl Into<String>,
        algo_ord_type: GridAlgoOrderType,
    ) -> Self {
        Self {
            algo_id: algo_id.into(),
            inst_id: inst_id.into(),
            algo_ord_type,
            stop_type: None,
        }
    }

    pub fn with_stop_type(mut self, stop_type: GridStopType) -> Self {
        self.stop_type = Some(stop_type);
        self
    }
}

impl ToWireMap for StopGridOrderRequest {
    fn to_wire_map(&self) -> WireResult<WireMap> {
        WireMap::new()
            .required("algoId", &self.algo_id)?
            .required("instId", &self.inst_id)?
            .required_enum("algoOrdType", self.algo_ord_type)?
            .optional("stopType", self.stop_type.as_ref())
    }
}

/// Close the position of a stopped contract grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseGridPositionRequest {
    pub algo_id: String,
    pub mkt_close: bool,
    pub sz: Option<Decimal>,
    pub px: Option<Decimal>,
}

impl CloseGridPositionRequest {
    /// Close everything at market.
    pub fn market(algo_id: impl Into<String>) -> Self {
        Self {
            algo_id: algo_id.into(),
            mkt_close: true,
            sz: None,
            px: None,
        }
    }

    /// Close `sz` contracts with a limit order at `px`.
    pub fn partial(algo_id: impl Into<String>, sz: Decimal, px: Decimal) -> Self {
        Self {
            algo_id: algo_id.into(),
            mkt_close: false,
            sz: Some(sz),
            px: Some(px),
        }
    }
}

impl ToWireMap for CloseGridPositionRequest {
    fn to_wire_map(&self) -> WireResult<WireMap> {
        let map = WireMap::new()
            .required("algoId", &self.algo_id)?
            .required("mktClose", &self.mkt_close)?;
        if self.mkt_close {
            map.optional("sz", self.sz.as_ref())?
                .optional("px", self.px.as_ref())
        } else {
            map.required_opt("sz", self.sz.as_ref())?
                .required_opt("px", self.px.as_ref())
        }
    }
}

// ============================================================================
// Queries
// ============================================================================

/// Filters for pending and historical grid orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridOrdersQuery {
    pub algo_ord_type: GridAlgoOrderType,
    pub algo_id: Option<String>,
    pub inst_id: Option<String>,
    pub inst_type: Option<InstrumentType>,
    pub cursor: PaginationCursor,
}

impl GridOrdersQuery {
    pub fn new(algo_ord_type: GridAlgoOrderType) -> Self {
        Self {
            algo_ord_type,
            algo_id: None,
            inst_id: None,
            inst_type: None,
            cursor: PaginationCursor::default(),
        }
    }

    pub fn with_algo_id(mut self, algo_id: impl Into<String>) -> Self {
        self.algo_id = Some(algo_id.into());
        self
    }

    pub fn with_instrument(mut self, inst_id: impl Into<String>) -> Self {
        self.inst_id = Some(inst_id.into());
        self
    }

    pub fn with_instrument_type(mut self, inst_type: InstrumentType) -> Self {
        self.inst_type = Some(inst_type);
        self
    }

    /// Cursors are algo IDs.
    pub fn with_cursor(mut self, cursor: PaginationCursor) -> Self {
        self.cursor = cursor;
        self
    }
}

impl ToWireMap for GridOrdersQuery {
    fn to_wire_map(&self) -> WireResult<WireMap> {
        let map = WireMap::new()
            .required_enum("algoOrdType", self.algo_ord_type)?
            .optional("algoId", self.algo_id.as_ref())?
            .optional("instId", self.inst_id.as_ref())?
            .optional_enum("instType", self.inst_type)?;
        self.cursor.write_to(map)
    }
}

/// A single grid, addressed by kind and algo ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridOrderRef {
    pub algo_ord_type: GridAlgoOrderType,
    pub algo_id: String,
}

impl GridOrderRef {
    pub fn new(algo_ord_type: GridAlgoOrderType, algo_id: impl Into<String>) -> Self {
        Self {
            algo_ord_type,
            algo_id: algo_id.into(),
        }
    }
}

impl ToWireMap for GridOrderRef {
    fn to_wire_map(&self) -> WireResult<WireMap> {
        WireMap::new()
            .required_enum("algoOrdType", self.algo_ord_type)?
            .required("algoId", &self.algo_id)
    }
}

/// Filters for the sub-orders of a grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSubOrdersQuery {
    pub grid: GridOrderRef,
    pub sub_type: GridSubOrderType,
    pub group_id: Option<String>,
    pub cursor: PaginationCursor,
}

impl GridSubOrdersQuery {
    pub fn new(grid: GridOrderRef, sub_type: GridSubOrderType) -> Self {
        Self {
            grid,
            sub_type,
            group_id: None,
            cursor: PaginationCursor::default(),
        }
    }

    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    /// Cursors are order IDs.
    pub fn with_cursor(mut self, cursor: PaginationCursor) -> Self {
        self.cursor = cursor;
        self
    }
}

impl ToWireMap for GridSubOrdersQuery {
    fn to_wire_map(&self) -> WireResult<WireMap> {
        let map = self
            .grid
            .to_wire_map()?
            .required_enum("type", self.sub_type)?
            .optional("groupId", self.group_id.as_ref())?;
        self.cursor.write_to(map)
    }
}

// ============================================================================
// Margin and income
// ============================================================================

/// Margin change of a contract grid, either as an amount or a percentage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridMarginRequest {
    pub algo_id: String,
    pub direction: MarginAddReduce,
    pub amt: Option<Decimal>,
    pub percent: Option<Decimal>,
}

impl GridMarginRequest {
    pub fn amount(algo_id: impl Into<String>, direction: MarginAddReduce, amt: Decimal) -> Self {
        Self {
            algo_id: algo_id.into(),
            direction,
            amt: Some(amt),
            percent: None,
        }
    }

    pub fn percent(
        algo_id: impl Into<String>,
        direction: MarginAddReduce,
        percent: Decimal,
    ) -> Self {
        Self {
            algo_id: algo_id.into(),
            direction,
            amt: None,
            percent: Some(percent),
        }
    }

    /// Parameters for `compute-margin-balance`, which only takes an amount.
    ///
    /// A percentage request is computed against an amount of zero.
    pub(crate) fn to_compute_map(&self) -> WireResult<WireMap> {
        WireMap::new()
            .required("algoId", &self.algo_id)?
            .required_enum("type", self.direction)?
            .required("amt", &self.amt.unwrap_or(Decimal::ZERO))
    }
}

impl ToWireMap for GridMarginRequest {
    fn to_wire_map(&self) -> WireResult<WireMap> {
        WireMap::new()
            .required("algoId", &self.algo_id)?
            .required_enum("type", self.direction)?
            .optional("amt", self.amt.as_ref())?
            .optional("percent", self.percent.as_ref())?
            .require_any(&["amt", "percent"], "amt or percent")
    }
}

// ============================================================================
// Public calculators
// ============================================================================

/// Inputs for the AI-recommended grid parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridAiParameterQuery {
    pub algo_ord_type: GridAlgoOrderType,
    pub inst_id: String,
    pub direction: Option<GridContractDirection>,
    pub duration: Option<GridBacktestDuration>,
}

impl GridAiParameterQuery {
    pub fn new(algo_ord_type: GridAlgoOrderType, inst_id: impl Into<String>) -> Self {
        Self {
            algo_ord_type,
            inst_id: inst_id.into(),
            direction: None,
            duration: None,
        }
    }

    /// Required for contract grids.
    pub fn with_direction(mut self, direction: GridContractDirection) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn with_duration(mut self, duration: GridBacktestDuration) -> Self {
        self.duration = Some(duration);
        self
    }
}

impl ToWireMap for GridAiParameterQuery {
    fn to_wire_map(&self) -> WireResult<WireMap> {
        WireMap::new()
            .required_enum("algoOrdType", self.algo_ord_type)?
            .required("instId", &self.inst_id)?
            .optional_enum("direction", self.direction)?
            .optional_enum("duration", self.duration)
    }
}

/// An amount already committed to the grid being sized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridInvestment {
    pub amt: Decimal,
    pub ccy: String,
}

impl GridInvestment {
    pub fn new(amt: Decimal, ccy: impl Into<String>) -> Self {
        Self {
            amt,
            ccy: ccy.into(),
        }
    }
}

impl ToWireMap for GridInvestment {
    fn to_wire_map(&self) -> WireResult<WireMap> {
        WireMap::new()
            .required("amt", &self.amt)?
            .required("ccy", &self.ccy)
    }
}

/// Inputs for the minimum-investment calculator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridMinInvestmentRequest {
    pub inst_id: String,
    pub algo_ord_type: GridAlgoOrderType,
    pub max_px: Decimal,
    pub min_px: Decimal,
    pub grid_num: u32,
    pub run_type: GridRunType,
    pub direction: Option<GridContractDirection>,
    pub lever: Option<Decimal>,
    pub base_pos: Option<bool>,
    pub investment_data: Option<Vec<GridInvestment>>,
}

impl GridMinInvestmentRequest {
    pub fn new(
        inst_id: impl Into<String>,
        algo_ord_type: GridAlgoOrderType,
        max_px: Decimal,
        min_px: Decimal,
        grid_num: u32,
        run_type: GridRunType,
    ) -> Self {
        Self {
            inst_id: inst_id.into(),
            algo_ord_type,
            max_px,
            min_px,
            grid_num,
            run_type,
            direction: None,
            lever: None,
            base_pos: None,
            investment_data: None,
        }
    }

    pub fn with_direction(mut self, direction: GridContractDirection) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn with_leverage(mut self, lever: Decimal) -> Self {
        self.lever = Some(lever);
        self
    }

    pub fn with_base_position(mut self, base_pos: bool) -> Self {
        self.base_pos = Some(base_pos);
        self
    }

    pub fn with_investment(mut self, investment: GridInvestment) -> Self {
        self.investment_data
            .get_or_insert_with(Vec::new)
            .push(investment);
        self
    }
}

impl ToWireMap for GridMinInvestmentRequest {
    fn to_wire_map(&self) -> WireResult<WireMap> {
        WireMap::new()
            .required("instId", &self.inst_id)?
            .required_enum("algoOrdType", self.algo_ord_type)?
            .required("maxPx", &self.max_px)?
            .required("minPx", &self.min_px)?
            .required("gridNum", &self.grid_num)?
            .required_enum("runType", self.run_type)?
            .optional_enum("direction", self.direction)?
            .optional("lever", self.lever.as_ref())?
            .optional("basePos", self.base_pos.as_ref())?
            .optional_maps("investmentData", self.investment_data.as_deref())
    }
}

/// Inputs for back-testing an RSI trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsiBacktestQuery {
    pub inst_id: String,
    pub timeframe: Timeframe,
    pub thold: Decimal,
    pub time_period: u32,
    pub trigger_cond: Option<GridTriggerCondition>,
    pub duration: String,
}

impl RsiBacktestQuery {
    pub fn new(
        inst_id: impl Into<String>,
        timeframe: Timeframe,
        thold: Decimal,
        time_period: u32,
    ) -> Self {
        Self {
            inst_id: inst_id.into(),
            timeframe,
            thold,
            time_period,
            trigger_cond: None,
            duration: DEFAULT_RSI_DURATION.to_string(),
        }
    }

    pub fn with_trigger_condition(mut self, trigger_cond: GridTriggerCondition) -> Self {
        self.trigger_cond = Some(trigger_cond);
        self
    }

    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = duration.into();
        self
    }
}

impl ToWireMap for RsiBacktestQuery {
    fn to_wire_map(&self) -> WireResult<WireMap> {
        WireMap::new()
            .required("instId", &self.inst_id)?
            .required_enum("timeframe", self.timeframe)?
            .required("thold", &self.thold)?
            .required("timePeriod", &self.time_period)?
            .optional_enum("triggerCond", self.trigger_cond)?
            .required("duration", &self.duration)
    }
}
