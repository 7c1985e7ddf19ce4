//! Trade operation descriptors.
//!
//! One constructor per exchange action. The REST and WebSocket wrappers only
//! pick a constructor and hand the result to their transport.

use crate::shared::enums::DebtType;
use crate::shared::error::WireResult;
use crate::shared::operation::Operation;
use crate::shared::pagination::PaginationCursor;
use crate::shared::wire::{ToWireMap, WireMap};

use super::requests::{
    debt_type_filter, AmendOrderRequest, ArchivePeriod, ClosePositionRequest, EasyConvertRequest,
    FillsQuery, MassCancelRequest, OneClickRepayRequest, OpenOrdersQuery, OrderHistoryQuery,
    OrderRef, PlaceOrderRequest,
};
use super::responses::{
    AccountRateLimit, ArchiveApplied, ArchiveLink, CancelAllAfterReply, ClosePositionReply,
    EasyConvertCurrencies, EasyConvertOrder, Fill, MassCancelReply, OneClickRepayCurrencies,
    OneClickRepayOrder, Order, OrderAck,
};

// REST paths
pub const PATH_ORDER: &str = "/api/v5/trade/order";
pub const PATH_BATCH_ORDERS: &str = "/api/v5/trade/batch-orders";
pub const PATH_CANCEL_ORDER: &str = "/api/v5/trade/cancel-order";
pub const PATH_CANCEL_BATCH_ORDERS: &str = "/api/v5/trade/cancel-batch-orders";
pub const PATH_AMEND_ORDER: &str = "/api/v5/trade/amend-order";
pub const PATH_AMEND_BATCH_ORDERS: &str = "/api/v5/trade/amend-batch-orders";
pub const PATH_CLOSE_POSITION: &str = "/api/v5/trade/close-position";
pub const PATH_ORDERS_PENDING: &str = "/api/v5/trade/orders-pending";
pub const PATH_ORDERS_HISTORY: &str = "/api/v5/trade/orders-history";
pub const PATH_ORDERS_HISTORY_ARCHIVE: &str = "/api/v5/trade/orders-history-archive";
pub const PATH_FILLS: &str = "/api/v5/trade/fills";
pub const PATH_FILLS_HISTORY: &str = "/api/v5/trade/fills-history";
pub const PATH_FILLS_ARCHIVE: &str = "/api/v5/trade/fills-archive";
pub const PATH_EASY_CONVERT_CURRENCY_LIST: &str = "/api/v5/trade/easy-convert-currency-list";
pub const PATH_EASY_CONVERT: &str = "/api/v5/trade/easy-convert";
pub const PATH_EASY_CONVERT_HISTORY: &str = "/api/v5/trade/easy-convert-history";
pub const PATH_ONE_CLICK_REPAY_CURRENCY_LIST: &str = "/api/v5/trade/one-click-repay-currency-list";
pub const PATH_ONE_CLICK_REPAY: &str = "/api/v5/trade/one-click-repay";
pub const PATH_ONE_CLICK_REPAY_HISTORY: &str = "/api/v5/trade/one-click-repay-history";
pub const PATH_MASS_CANCEL: &str = "/api/v5/trade/mass-cancel";
pub const PATH_CANCEL_ALL_AFTER: &str = "/api/v5/trade/cancel-all-after";
pub const PATH_ACCOUNT_RATE_LIMIT: &str = "/api/v5/trade/account-rate-limit";

// WebSocket operations
pub const WS_OP_ORDER: &str = "order";
pub const WS_OP_BATCH_ORDERS: &str = "batch-orders";
pub const WS_OP_CANCEL_ORDER: &str = "cancel-order";
pub const WS_OP_BATCH_CANCEL_ORDERS: &str = "batch-cancel-orders";
pub const WS_OP_AMEND_ORDER: &str = "amend-order";
pub const WS_OP_BATCH_AMEND_ORDERS: &str = "batch-amend-orders";
pub const WS_OP_MASS_CANCEL: &str = "mass-cancel";

fn wire_maps<R: ToWireMap>(items: &[R]) -> WireResult<Vec<WireMap>> {
    items.iter().map(ToWireMap::to_wire_map).collect()
}

// ─── REST ───────────────────────────────────────────────────────────────────

pub fn place_order(request: &PlaceOrderRequest) -> WireResult<Operation<OrderAck>> {
    Ok(Operation::post(PATH_ORDER, request.to_wire_map()?).tagged())
}

pub fn place_orders(requests: &[PlaceOrderRequest]) -> WireResult<Operation<Vec<OrderAck>>> {
    Ok(Operation::post_batch(PATH_BATCH_ORDERS, wire_maps(requests)?)?.tagged())
}

pub fn cancel_order(order: &OrderRef) -> WireResult<Operation<OrderAck>> {
    Ok(Operation::post(PATH_CANCEL_ORDER, order.to_wire_map()?))
}

pub fn cancel_orders(orders: &[OrderRef]) -> WireResult<Operation<Vec<OrderAck>>> {
    Operation::post_batch(PATH_CANCEL_BATCH_ORDERS, wire_maps(orders)?)
}

pub fn amend_order(request: &AmendOrderRequest) -> WireResult<Operation<OrderAck>> {
    Ok(Operation::post(PATH_AMEND_ORDER, request.to_wire_map()?))
}

pub fn amend_orders(requests: &[AmendOrderRequest]) -> WireResult<Operation<Vec<OrderAck>>> {
    Operation::post_batch(PATH_AMEND_BATCH_ORDERS, wire_maps(requests)?)
}

pub fn close_position(request: &ClosePositionRequest) -> WireResult<Operation<ClosePositionReply>> {
    Ok(Operation::post(PATH_CLOSE_POSITION, request.to_wire_map()?).tagged())
}

pub fn get_order(order: &OrderRef) -> WireResult<Operation<Order>> {
    Ok(Operation::get(PATH_ORDER, order.to_wire_map()?))
}

pub fn get_open_orders(query: &OpenOrdersQuery) -> WireResult<Operation<Vec<Order>>> {
    Ok(Operation::get(PATH_ORDERS_PENDING, query.to_wire_map()?).list())
}

pub fn get_order_history(query: &OrderHistoryQuery) -> WireResult<Operation<Vec<Order>>> {
    Ok(Operation::get(PATH_ORDERS_HISTORY, query.to_wire_map()?).list())
}

pub fn get_order_archive(query: &OrderHistoryQuery) -> WireResult<Operation<Vec<Order>>> {
    Ok(Operation::get(PATH_ORDERS_HISTORY_ARCHIVE, query.to_wire_map()?).list())
}

pub fn get_fills(query: &FillsQuery) -> WireResult<Operation<Vec<Fill>>> {
    Ok(Operation::get(PATH_FILLS, query.to_wire_map()?).list())
}

pub fn get_fills_history(query: &FillsQuery) -> WireResult<Operation<Vec<Fill>>> {
    Ok(Operation::get(PATH_FILLS_HISTORY, query.to_history_map()?).list())
}

pub fn apply_fills_archive(period: &ArchivePeriod) -> WireResult<Operation<ArchiveApplied>> {
    Ok(Operation::post(PATH_FILLS_ARCHIVE, period.to_wire_map()?))
}

pub fn get_fills_archive(period: &ArchivePeriod) -> WireResult<Operation<ArchiveLink>> {
    Ok(Operation::get(PATH_FILLS_ARCHIVE, period.to_wire_map()?))
}

pub fn get_easy_convert_currencies() -> Operation<EasyConvertCurrencies> {
    Operation::get(PATH_EASY_CONVERT_CURRENCY_LIST, WireMap::new())
}

pub fn easy_convert(request: &EasyConvertRequest) -> WireResult<Operation<Vec<EasyConvertOrder>>> {
    Ok(Operation::post(PATH_EASY_CONVERT, request.to_wire_map()?).list())
}

pub fn get_easy_convert_history(
    cursor: &PaginationCursor,
) -> WireResult<Operation<Vec<EasyConvertOrder>>> {
    Ok(Operation::get(PATH_EASY_CONVERT_HISTORY, cursor.write_to(WireMap::new())?).list())
}

pub fn get_one_click_repay_currencies(
    debt_type: Option<DebtType>,
) -> WireResult<Operation<Vec<OneClickRepayCurrencies>>> {
    Ok(Operation::get(PATH_ONE_CLICK_REPAY_CURRENCY_LIST, debt_type_filter(debt_type)?).list())
}

pub fn one_click_repay(
    request: &OneClickRepayRequest,
) -> WireResult<Operation<Vec<OneClickRepayOrder>>> {
    Ok(Operation::post(PATH_ONE_CLICK_REPAY, request.to_wire_map()?).list())
}

pub fn get_one_click_repay_history(
    cursor: &PaginationCursor,
) -> WireResult<Operation<Vec<OneClickRepayOrder>>> {
    Ok(Operation::get(PATH_ONE_CLICK_REPAY_HISTORY, cursor.write_to(WireMap::new())?).list())
}

pub fn mass_cancel(request: &MassCancelRequest) -> WireResult<Operation<MassCancelReply>> {
    Ok(Operation::post(PATH_MASS_CANCEL, request.to_wire_map()?))
}

/// `timeout_secs` of 0 disables the countdown; otherwise 10-120.
pub fn cancel_all_after(
    timeout_secs: u32,
    tag: Option<&str>,
) -> WireResult<Operation<CancelAllAfterReply>> {
    let params = WireMap::new()
        .required("timeOut", &timeout_secs)?
        .optional("tag", tag.as_ref())?;
    Ok(Operation::post(PATH_CANCEL_ALL_AFTER, params))
}

pub fn get_account_rate_limit() -> Operation<AccountRateLimit> {
    Operation::get(PATH_ACCOUNT_RATE_LIMIT, WireMap::new())
}

// ─── WebSocket ──────────────────────────────────────────────────────────────

pub fn ws_place_order(request: &PlaceOrderRequest) -> WireResult<Operation<OrderAck>> {
    Ok(Operation::socket(WS_OP_ORDER, request.to_wire_map()?).tagged())
}

pub fn ws_place_orders(requests: &[PlaceOrderRequest]) -> WireResult<Operation<Vec<OrderAck>>> {
    Ok(Operation::socket_batch(WS_OP_BATCH_ORDERS, wire_maps(requests)?)?.tagged())
}

pub fn ws_cancel_order(order: &OrderRef) -> WireResult<Operation<OrderAck>> {
    Ok(Operation::socket(WS_OP_CANCEL_ORDER, order.to_wire_map()?))
}

pub fn ws_cancel_orders(orders: &[OrderRef]) -> WireResult<Operation<Vec<OrderAck>>> {
    Operation::socket_batch(WS_OP_BATCH_CANCEL_ORDERS, wire_maps(orders)?)
}

pub fn ws_amend_order(request: &AmendOrderRequest) -> WireResult<Operation<OrderAck>> {
    Ok(Operation::socket(WS_OP_AMEND_ORDER, request.to_wire_map()?))
}

pub fn ws_amend_orders(requests: &[AmendOrderRequest]) -> WireResult<Operation<Vec<OrderAck>>> {
    Operation::socket_batch(WS_OP_BATCH_AMEND_ORDERS, wire_maps(requests)?)
}

pub fn ws_mass_cancel(request: &MassCancelRequest) -> WireResult<Operation<MassCancelReply>> {
    Ok(Operation::socket(WS_OP_MASS_CANCEL, request.to_wire_map()?))
}
