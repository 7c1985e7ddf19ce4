//! Grid trading endpoints over REST.

use crate::api::client::OkxRestClient;
use crate::api::error::ApiResult;

use super::operations as ops;
use super::requests::{
    AmendGridOrderRequest, CloseGridPositionRequest, GridAiParameterQuery, GridMarginRequest,
    GridMinInvestmentRequest, GridOrderRef, GridOrdersQuery, GridSubOrdersQuery,
    PlaceGridOrderRequest, RsiBacktestQuery, StopGridOrderRequest,
};
use super::responses::{
    GridAiParameter, GridAlgoOrder, GridCloseReply, GridComputedMarginBalance, GridMinInvestment,
    GridOrderAck, GridPosition, GridRsiBacktest, GridSubOrder, GridWithdrawIncome,
};

impl OkxRestClient {
    // =========================================================================
    // Grid order entry
    // =========================================================================

    /// Start a spot or contract grid.
    pub async fn place_grid_order(&self, request: &PlaceGridOrderRequest) -> ApiResult<GridOrderAck> {
        self.invoke(&ops::place_grid_order(request)?).await
    }

    pub async fn amend_grid_order(&self, request: &AmendGridOrderRequest) -> ApiResult<GridOrderAck> {
        self.invoke(&ops::amend_grid_order(request)?).await
    }

    /// Stop up to 20 grids. Each item carries its own status.
    pub async fn stop_grid_orders(
        &self,
        requests: &[StopGridOrderRequest],
    ) -> ApiResult<Vec<GridOrderAck>> {
        self.invoke(&ops::stop_grid_orders(requests)?).await
    }

    /// Close the position of a stopped contract grid.
    pub async fn close_grid_position(
        &self,
        request: &CloseGridPositionRequest,
    ) -> ApiResult<GridCloseReply> {
        self.invoke(&ops::close_grid_position(request)?).await
    }

    pub async fn cancel_grid_close_order(
        &self,
        algo_id: &str,
        ord_id: &str,
    ) -> ApiResult<GridCloseReply> {
        self.invoke(&ops::cancel_grid_close_order(algo_id, ord_id)?).await
    }

    /// Start a grid waiting on its trigger right away.
    pub async fn trigger_grid_order(&self, algo_id: &str) -> ApiResult<GridOrderAck> {
        self.invoke(&ops::trigger_grid_order(algo_id)?).await
    }

    // =========================================================================
    // Grid queries
    // =========================================================================

    pub async fn get_grid_open_orders(&self, query: &GridOrdersQuery) -> ApiResult<Vec<GridAlgoOrder>> {
        self.invoke(&ops::get_grid_open_orders(query)?).await
    }

    pub async fn get_grid_order_history(
        &self,
        query: &GridOrdersQuery,
    ) -> ApiResult<Vec<GridAlgoOrder>> {
        self.invoke(&ops::get_grid_order_history(query)?).await
    }

    pub async fn get_grid_order_details(&self, grid: &GridOrderRef) -> ApiResult<GridAlgoOrder> {
        self.invoke(&ops::get_grid_order_details(grid)?).await
    }

    pub async fn get_grid_sub_orders(
        &self,
        query: &GridSubOrdersQuery,
    ) -> ApiResult<Vec<GridSubOrder>> {
        self.invoke(&ops::get_grid_sub_orders(query)?).await
    }

    pub async fn get_grid_positions(&self, grid: &GridOrderRef) -> ApiResult<Vec<GridPosition>> {
        self.invoke(&ops::get_grid_positions(grid)?).await
    }

    // =========================================================================
    // Grid funds
    // =========================================================================

    /// Move the profit of a spot grid to the trading account.
    pub async fn withdraw_grid_income(&self, algo_id: &str) -> ApiResult<GridWithdrawIncome> {
        self.invoke(&ops::withdraw_grid_income(algo_id)?).await
    }

    /// Preview a margin change without applying it.
    pub async fn compute_grid_margin_balance(
        &self,
        request: &GridMarginRequest,
    ) -> ApiResult<GridComputedMarginBalance> {
        self.invoke(&ops::compute_grid_margin_balance(request)?).await
    }

    pub async fn adjust_grid_margin_balance(
        &self,
        request: &GridMarginRequest,
    ) -> ApiResult<GridOrderAck> {
        self.invoke(&ops::adjust_grid_margin_balance(request)?).await
    }

    // =========================================================================
    // Public calculators
    // =========================================================================

    pub async fn get_grid_ai_parameter(
        &self,
        query: &GridAiParameterQuery,
    ) -> ApiResult<GridAiParameter> {
        self.invoke(&ops::get_grid_ai_parameter(query)?).await
    }

    pub async fn compute_grid_min_investment(
        &self,
        request: &GridMinInvestmentRequest,
    ) -> ApiResult<GridMinInvestment> {
        self.invoke(&ops::compute_grid_min_investment(request)?).await
    }

    /// How often an RSI trigger would have fired.
    pub async fn rsi_back_testing(&self, query: &RsiBacktestQuery) -> ApiResult<GridRsiBacktest> {
        self.invoke(&ops::rsi_back_testing(query)?).await
    }
}
