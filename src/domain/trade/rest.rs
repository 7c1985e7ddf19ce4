//! Trade endpoints over REST.

use crate::api::client::OkxRestClient;
use crate::api::error::ApiResult;
use crate::shared::enums::DebtType;
use crate::shared::pagination::PaginationCursor;

use super::operations as ops;
use super::requests::{
    AmendOrderRequest, ArchivePeriod, ClosePositionRequest, EasyConvertRequest, FillsQuery,
    MassCancelRequest, OneClickRepayRequest, OpenOrdersQuery, OrderHistoryQuery, OrderRef,
    PlaceOrderRequest,
};
use super::responses::{
    AccountRateLimit, ArchiveApplied, ArchiveLink, CancelAllAfterReply, ClosePositionReply,
    EasyConvertCurrencies, EasyConvertOrder, Fill, MassCancelReply, OneClickRepayCurrencies,
    OneClickRepayOrder, Order, OrderAck,
};

impl OkxRestClient {
    // =========================================================================
    // Order entry
    // =========================================================================

    /// Place an order.
    pub async fn place_order(&self, request: &PlaceOrderRequest) -> ApiResult<OrderAck> {
        self.invoke(&ops::place_order(request)?).await
    }

    /// Place up to 20 orders. Each item carries its own status.
    pub async fn place_orders(&self, requests: &[PlaceOrderRequest]) -> ApiResult<Vec<OrderAck>> {
        self.invoke(&ops::place_orders(requests)?).await
    }

    /// Cancel an incomplete order.
    pub async fn cancel_order(&self, order: &OrderRef) -> ApiResult<OrderAck> {
        self.invoke(&ops::cancel_order(order)?).await
    }

    /// Cancel up to 20 orders. Each item carries its own status.
    pub async fn cancel_orders(&self, orders: &[OrderRef]) -> ApiResult<Vec<OrderAck>> {
        self.invoke(&ops::cancel_orders(orders)?).await
    }

    /// Amend an incomplete order.
    pub async fn amend_order(&self, request: &AmendOrderRequest) -> ApiResult<OrderAck> {
        self.invoke(&ops::amend_order(request)?).await
    }

    /// Amend up to 20 orders. Each item carries its own status.
    pub async fn amend_orders(&self, requests: &[AmendOrderRequest]) -> ApiResult<Vec<OrderAck>> {
        self.invoke(&ops::amend_orders(requests)?).await
    }

    /// Close a position with a market order.
    pub async fn close_position(
        &self,
        request: &ClosePositionRequest,
    ) -> ApiResult<ClosePositionReply> {
        self.invoke(&ops::close_position(request)?).await
    }

    /// Cancel all MMP pending orders of an instrument family.
    pub async fn mass_cancel(&self, request: &MassCancelRequest) -> ApiResult<MassCancelReply> {
        self.invoke(&ops::mass_cancel(request)?).await
    }

    /// Arm (or with 0, disarm) the cancel-all countdown.
    pub async fn cancel_all_after(
        &self,
        timeout_secs: u32,
        tag: Option<&str>,
    ) -> ApiResult<CancelAllAfterReply> {
        self.invoke(&ops::cancel_all_after(timeout_secs, tag)?).await
    }

    // =========================================================================
    // Orders and fills
    // =========================================================================

    pub async fn get_order(&self, order: &OrderRef) -> ApiResult<Order> {
        self.invoke(&ops::get_order(order)?).await
    }

    pub async fn get_open_orders(&self, query: &OpenOrdersQuery) -> ApiResult<Vec<Order>> {
        self.invoke(&ops::get_open_orders(query)?).await
    }

    /// Completed orders of the last 7 days.
    pub async fn get_order_history(&self, query: &OrderHistoryQuery) -> ApiResult<Vec<Order>> {
        self.invoke(&ops::get_order_history(query)?).await
    }

    /// Completed orders of the last 3 months.
    pub async fn get_order_archive(&self, query: &OrderHistoryQuery) -> ApiResult<Vec<Order>> {
        self.invoke(&ops::get_order_archive(query)?).await
    }

    /// Fills of the last 3 days.
    pub async fn get_fills(&self, query: &FillsQuery) -> ApiResult<Vec<Fill>> {
        self.invoke(&ops::get_fills(query)?).await
    }

    /// Fills of the last 3 months. `instType` is required.
    pub async fn get_fills_history(&self, query: &FillsQuery) -> ApiResult<Vec<Fill>> {
        self.invoke(&ops::get_fills_history(query)?).await
    }

    /// Ask the exchange to build a fills archive for a quarter.
    pub async fn apply_fills_archive(&self, period: &ArchivePeriod) -> ApiResult<ArchiveApplied> {
        self.invoke(&ops::apply_fills_archive(period)?).await
    }

    pub async fn get_fills_archive(&self, period: &ArchivePeriod) -> ApiResult<ArchiveLink> {
        self.invoke(&ops::get_fills_archive(period)?).await
    }

    // =========================================================================
    // Easy convert and one-click repay
    // =========================================================================

    pub async fn get_easy_convert_currencies(&self) -> ApiResult<EasyConvertCurrencies> {
        self.invoke(&ops::get_easy_convert_currencies()).await
    }

    pub async fn easy_convert(
        &self,
        request: &EasyConvertRequest,
    ) -> ApiResult<Vec<EasyConvertOrder>> {
        self.invoke(&ops::easy_convert(request)?).await
    }

    pub async fn get_easy_convert_history(
        &self,
        cursor: &PaginationCursor,
    ) -> ApiResult<Vec<EasyConvertOrder>> {
        self.invoke(&ops::get_easy_convert_history(cursor)?).await
    }

    pub async fn get_one_click_repay_currencies(
        &self,
        debt_type: Option<DebtType>,
    ) -> ApiResult<Vec<OneClickRepayCurrencies>> {
        self.invoke(&ops::get_one_click_repay_currencies(debt_type)?)
            .await
    }

    pub async fn one_click_repay(
        &self,
        request: &OneClickRepayRequest,
    ) -> ApiResult<Vec<OneClickRepayOrder>> {
        self.invoke(&ops::one_click_repay(request)?).await
    }

    pub async fn get_one_click_repay_history(
        &self,
        cursor: &PaginationCursor,
    ) -> ApiResult<Vec<OneClickRepayOrder>> {
        self.invoke(&ops::get_one_click_repay_history(cursor)?).await
    }

    pub async fn get_account_rate_limit(&self) -> ApiResult<AccountRateLimit> {
        self.invoke(&ops::get_account_rate_limit()).await
    }
}
