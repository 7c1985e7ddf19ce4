//! Grid trading operation descriptors.
//!
//! All paths sit under `/api/v5/tradingBot/grid/`. The three calculators
//! (`ai-param`, `min-investment`, `rsi-back-testing`) are public and go out
//! unsigned.

use crate::shared::error::WireResult;
use crate::shared::operation::Operation;
use crate::shared::wire::{ToWireMap, WireMap};

use super::requests::{
    AmendGridOrderRequest, CloseGridPositionRequest, GridAiParameterQuery, GridMarginRequest,
    GridMinInvestmentRequest, GridOrderRef, GridOrdersQuery, GridSubOrdersQuery,
    PlaceGridOrderRequest, RsiBacktestQuery, StopGridOrderRequest,
};
use super::responses::{
    GridAiParameter, GridAlgoOrder, GridCloseReply, GridComputedMarginBalance, GridMinInvestment,
    GridOrderAck, GridPosition, GridRsiBacktest, GridSubOrder, GridWithdrawIncome,
};

pub const PATH_ORDER_ALGO: &str = "/api/v5/tradingBot/grid/order-algo";
pub const PATH_AMEND_ORDER_ALGO: &str = "/api/v5/tradingBot/grid/amend-order-algo";
pub const PATH_STOP_ORDER_ALGO: &str = "/api/v5/tradingBot/grid/stop-order-algo";
pub const PATH_CLOSE_POSITION: &str = "/api/v5/tradingBot/grid/close-position";
pub const PATH_CANCEL_CLOSE_ORDER: &str = "/api/v5/tradingBot/grid/cancel-close-order";
pub const PATH_ORDER_INSTANT_TRIGGER: &str = "/api/v5/tradingBot/grid/order-instant-trigger";
pub const PATH_ORDERS_ALGO_PENDING: &str = "/api/v5/tradingBot/grid/orders-algo-pending";
pub const PATH_ORDERS_ALGO_HISTORY: &str = "/api/v5/tradingBot/grid/orders-algo-history";
pub const PATH_ORDERS_ALGO_DETAILS: &str = "/api/v5/tradingBot/grid/orders-algo-details";
pub const PATH_SUB_ORDERS: &str = "/api/v5/tradingBot/grid/sub-orders";
pub const PATH_POSITIONS: &str = "/api/v5/tradingBot/grid/positions";
pub const PATH_WITHDRAW_INCOME: &str = "/api/v5/tradingBot/grid/withdraw-income";
pub const PATH_COMPUTE_MARGIN_BALANCE: &str = "/api/v5/tradingBot/grid/compute-margin-balance";
pub const PATH_MARGIN_BALANCE: &str = "/api/v5/tradingBot/grid/margin-balance";
pub const PATH_AI_PARAM: &str = "/api/v5/tradingBot/grid/ai-param";
pub const PATH_MIN_INVESTMENT: &str = "/api/v5/tradingBot/grid/min-investment";
pub const PATH_RSI_BACK_TESTING: &str = "/api/v5/tradingBot/grid/rsi-back-testing";

fn algo_id_map(algo_id: &str) -> WireResult<WireMap> {
    WireMap::new().required("algoId", algo_id)
}

pub fn place_grid_order(request: &PlaceGridOrderRequest) -> WireResult<Operation<GridOrderAck>> {
    Ok(Operation::post(PATH_ORDER_ALGO, request.to_wire_map()?).tagged())
}

pub fn amend_grid_order(request: &AmendGridOrderRequest) -> WireResult<Operation<GridOrderAck>> {
    Ok(Operation::post(PATH_AMEND_ORDER_ALGO, request.to_wire_map()?))
}

pub fn stop_grid_orders(
    requests: &[StopGridOrderRequest],
) -> WireResult<Operation<Vec<GridOrderAck>>> {
    let items = requests
        .iter()
        .map(ToWireMap::to_wire_map)
        .collect::<WireResult<Vec<_>>>()?;
    Operation::post_batch(PATH_STOP_ORDER_ALGO, items)
}

pub fn close_grid_position(
    request: &CloseGridPositionRequest,
) -> WireResult<Operation<GridCloseReply>> {
    Ok(Operation::post(PATH_CLOSE_POSITION, request.to_wire_map()?))
}

pub fn cancel_grid_close_order(
    algo_id: &str,
    ord_id: &str,
) -> WireResult<Operation<GridCloseReply>> {
    let params = algo_id_map(algo_id)?.required("ordId", ord_id)?;
    Ok(Operation::post(PATH_CANCEL_CLOSE_ORDER, params))
}

pub fn trigger_grid_order(algo_id: &str) -> WireResult<Operation<GridOrderAck>> {
    Ok(Operation::post(PATH_ORDER_INSTANT_TRIGGER, algo_id_map(algo_id)?))
}

pub fn get_grid_open_orders(query: &GridOrdersQuery) -> WireResult<Operation<Vec<GridAlgoOrder>>> {
    Ok(Operation::get(PATH_ORDERS_ALGO_PENDING, query.to_wire_map()?).list())
}

pub fn get_grid_order_history(
    query: &GridOrdersQuery,
) -> WireResult<Operation<Vec<GridAlgoOrder>>> {
    Ok(Operation::get(PATH_ORDERS_ALGO_HISTORY, query.to_wire_map()?).list())
}

pub fn get_grid_order_details(grid: &GridOrderRef) -> WireResult<Operation<GridAlgoOrder>> {
    Ok(Operation::get(PATH_ORDERS_ALGO_DETAILS, grid.to_wire_map()?))
}

pub fn get_grid_sub_orders(
    query: &GridSubOrdersQuery,
) -> WireResult<Operation<Vec<GridSubOrder>>> {
    Ok(Operation::get(PATH_SUB_ORDERS, query.to_wire_map()?).list())
}

pub fn get_grid_positions(grid: &GridOrderRef) -> WireResult<Operation<Vec<GridPosition>>> {
    Ok(Operation::get(PATH_POSITIONS, grid.to_wire_map()?).list())
}

pub fn withdraw_grid_income(algo_id: &str) -> WireResult<Operation<GridWithdrawIncome>> {
    Ok(Operation::post(PATH_WITHDRAW_INCOME, algo_id_map(algo_id)?))
}

pub fn compute_grid_margin_balance(
    request: &GridMarginRequest,
) -> WireResult<Operation<GridComputedMarginBalance>> {
    Ok(Operation::post(PATH_COMPUTE_MARGIN_BALANCE, request.to_compute_map()?))
}

pub fn adjust_grid_margin_balance(
    request: &GridMarginRequest,
) -> WireResult<Operation<GridOrderAck>> {
    Ok(Operation::post(PATH_MARGIN_BALANCE, request.to_wire_map()?))
}

pub fn get_grid_ai_parameter(
    query: &GridAiParameterQuery,
) -> WireResult<Operation<GridAiParameter>> {
    Ok(Operation::get(PATH_AI_PARAM, query.to_wire_map()?).unsigned())
}

pub fn compute_grid_min_investment(
    request: &GridMinInvestmentRequest,
) -> WireResult<Operation<GridMinInvestment>> {
    Ok(Operation::post(PATH_MIN_INVESTMENT, request.to_wire_map()?).unsigned())
}

pub fn rsi_back_testing(query: &RsiBacktestQuery) -> WireResult<Operation<GridRsiBacktest>> {
    Ok(Operation::get(PATH_RSI_BACK_TESTING, query.to_wire_map()?).unsigned())
}
