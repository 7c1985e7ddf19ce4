//! Grid trading response types.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::shared::decimal::lenient;
use crate::shared::enums::{
    opt_wire, GridAlgoOrderType, GridAlgoState, GridContractDirection, GridRunType,
    GridTriggerAction, GridTriggerCondition, GridTriggerStrategy, InstrumentType, MarginMode,
    OrderSide, OrderState, OrderType, PositionSide, Timeframe, TradeMode, Wire,
};
use crate::shared::reply::ItemStatus;

/// Acknowledgement for grid placement, amendment, stop and margin changes.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GridOrderAck {
    #[serde(default)]
    pub algo_id: String,
    #[serde(default)]
    pub algo_cl_ord_id: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub s_code: String,
    #[serde(default)]
    pub s_msg: String,
}

impl ItemStatus for GridOrderAck {
    fn s_code(&self) -> &str {
        &self.s_code
    }

    fn s_msg(&self) -> &str {
        &self.s_msg
    }
}

/// Reply to closing a grid position or cancelling its close order.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GridCloseReply {
    pub algo_id: String,
    #[serde(default)]
    pub ord_id: String,
    #[serde(default)]
    pub algo_cl_ord_id: String,
    #[serde(default)]
    pub tag: String,
}

/// A trigger as echoed back on a grid order.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GridTrigger {
    #[serde(default, deserialize_with = "opt_wire")]
    pub trigger_action: Option<Wire<GridTriggerAction>>,
    #[serde(default, deserialize_with = "opt_wire")]
    pub trigger_strategy: Option<Wire<GridTriggerStrategy>>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub delay_seconds: Option<i64>,
    /// Unix milliseconds the trigger fired, if it has
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub trigger_time: Option<i64>,
    #[serde(default)]
    pub trigger_type: String,
    #[serde(default, deserialize_with = "opt_wire")]
    pub timeframe: Option<Wire<Timeframe>>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub thold: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_wire")]
    pub trigger_cond: Option<Wire<GridTriggerCondition>>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub time_period: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub trigger_px: Option<Decimal>,
    /// `"1"` or `"2"`; the meaning depends on the grid kind
    #[serde(default)]
    pub stop_type: String,
}

/// A grid algo order.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GridAlgoOrder {
    pub algo_id: String,
    #[serde(default)]
    pub algo_cl_ord_id: String,
    pub inst_type: Wire<InstrumentType>,
    pub inst_id: String,
    pub algo_ord_type: Wire<GridAlgoOrderType>,
    pub state: Wire<GridAlgoState>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub max_px: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub min_px: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub grid_num: Option<i64>,
    #[serde(default, deserialize_with = "opt_wire")]
    pub run_type: Option<Wire<GridRunType>>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub tp_trigger_px: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub sl_trigger_px: Option<Decimal>,
    #[serde(default)]
    pub trigger_params: Vec<GridTrigger>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub trade_num: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub arbitrage_num: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub single_amt: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub per_min_profit_rate: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub per_max_profit_rate: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub investment: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub total_pnl: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub pnl_ratio: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub grid_profit: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub float_profit: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub annualized_rate: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub quote_sz: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub base_sz: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub cur_quote_sz: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub cur_base_sz: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub sz: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_wire")]
    pub direction: Option<Wire<GridContractDirection>>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub base_pos: bool,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub lever: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub actual_lever: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub liq_px: Option<Decimal>,
    #[serde(default)]
    pub uly: String,
    #[serde(default)]
    pub inst_family: String,
    #[serde(default)]
    pub stop_type: String,
    #[serde(default)]
    pub cancel_type: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub c_time: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub u_time: Option<i64>,
}

/// An order placed by a grid.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GridSubOrder {
    pub algo_id: String,
    #[serde(default)]
    pub algo_cl_ord_id: String,
    #[serde(default, deserialize_with = "opt_wire")]
    pub algo_ord_type: Option<Wire<GridAlgoOrderType>>,
    pub inst_type: Wire<InstrumentType>,
    pub inst_id: String,
    #[serde(default)]
    pub group_id: String,
    pub ord_id: String,
    #[serde(default, deserialize_with = "opt_wire")]
    pub td_mode: Option<Wire<TradeMode>>,
    #[serde(default)]
    pub ccy: String,
    #[serde(default, deserialize_with = "opt_wire")]
    pub ord_type: Option<Wire<OrderType>>,
    pub side: Wire<OrderSide>,
    #[serde(default, deserialize_with = "opt_wire")]
    pub pos_side: Option<Wire<PositionSide>>,
    #[serde(default, deserialize_with = "opt_wire")]
    pub state: Option<Wire<OrderState>>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub px: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub sz: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub avg_px: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub acc_fill_sz: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub fee: Option<Decimal>,
    #[serde(default)]
    pub fee_ccy: String,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub pnl: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub ct_val: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub lever: Option<Decimal>,
    #[serde(default)]
    pub tag: String,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub c_time: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub u_time: Option<i64>,
}

/// Position held by a contract grid.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GridPosition {
    pub algo_id: String,
    #[serde(default)]
    pub algo_cl_ord_id: String,
    pub inst_type: Wire<InstrumentType>,
    pub inst_id: String,
    #[serde(default, deserialize_with = "opt_wire")]
    pub mgn_mode: Option<Wire<MarginMode>>,
    #[serde(default, deserialize_with = "opt_wire")]
    pub pos_side: Option<Wire<PositionSide>>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub pos: Option<Decimal>,
    #[serde(default)]
    pub ccy: String,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub avg_px: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub last: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub mark_px: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub liq_px: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub lever: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub imr: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub mmr: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub mgn_ratio: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub notional_usd: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub upl: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub upl_ratio: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub adl: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub c_time: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub u_time: Option<i64>,
}

/// Profit moved out of a spot grid.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GridWithdrawIncome {
    pub algo_id: String,
    #[serde(default)]
    pub algo_cl_ord_id: String,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub profit: Option<Decimal>,
}

/// Result of a margin-change dry run.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GridComputedMarginBalance {
    /// Largest amount that can be added or reduced
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub max_amt: Option<Decimal>,
    /// Leverage after the change
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub lever: Option<Decimal>,
}

/// Recommended parameters for a new grid.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GridAiParameter {
    pub inst_id: String,
    pub algo_ord_type: Wire<GridAlgoOrderType>,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub ccy: String,
    #[serde(default)]
    pub source_ccy: String,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub grid_num: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub max_px: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub min_px: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub per_max_profit_rate: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub per_min_profit_rate: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub annualized_rate: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub min_investment: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_wire")]
    pub run_type: Option<Wire<GridRunType>>,
    #[serde(default, deserialize_with = "opt_wire")]
    pub direction: Option<Wire<GridContractDirection>>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub lever: Option<Decimal>,
}

/// One currency amount of a minimum investment.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GridInvestmentAmount {
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub amt: Option<Decimal>,
    pub ccy: String,
}

/// Minimum investment for a grid configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GridMinInvestment {
    #[serde(default)]
    pub min_investment_data: Vec<GridInvestmentAmount>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub single_amt: Option<Decimal>,
}

/// RSI back-test result.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GridRsiBacktest {
    /// How often the trigger would have fired over the window
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub trigger_num: Option<i64>,
}
