//! Trade endpoints over a private WebSocket session.

use crate::shared::enums::{InstrumentType, WireEnum};
use crate::websocket::client::OkxWebSocketSession;
use crate::websocket::error::WsResult;
use crate::websocket::subscriptions::SubscriptionHandle;
use crate::websocket::types::ChannelArg;

use super::operations as ops;
use super::requests::{AmendOrderRequest, MassCancelRequest, OrderRef, PlaceOrderRequest};
use super::responses::{MassCancelReply, Order, OrderAck};

/// Private channel pushing order updates.
pub const ORDERS_CHANNEL: &str = "orders";

impl OkxWebSocketSession {
    /// Place an order.
    pub async fn place_order(&self, request: &PlaceOrderRequest) -> WsResult<OrderAck> {
        self.query(&ops::ws_place_order(request)?).await
    }

    /// Place up to 20 orders. Each item carries its own status.
    pub async fn place_orders(&self, requests: &[PlaceOrderRequest]) -> WsResult<Vec<OrderAck>> {
        self.query(&ops::ws_place_orders(requests)?).await
    }

    pub async fn cancel_order(&self, order: &OrderRef) -> WsResult<OrderAck> {
        self.query(&ops::ws_cancel_order(order)?).await
    }

    /// Cancel up to 20 orders. Each item carries its own status.
    pub async fn cancel_orders(&self, orders: &[OrderRef]) -> WsResult<Vec<OrderAck>> {
        self.query(&ops::ws_cancel_orders(orders)?).await
    }

    pub async fn amend_order(&self, request: &AmendOrderRequest) -> WsResult<OrderAck> {
        self.query(&ops::ws_amend_order(request)?).await
    }

    /// Amend up to 20 orders. Each item carries its own status.
    pub async fn amend_orders(&self, requests: &[AmendOrderRequest]) -> WsResult<Vec<OrderAck>> {
        self.query(&ops::ws_amend_orders(requests)?).await
    }

    /// Cancel all MMP pending orders of an instrument family.
    pub async fn mass_cancel(&self, request: &MassCancelRequest) -> WsResult<MassCancelReply> {
        self.query(&ops::ws_mass_cancel(request)?).await
    }

    /// Receive order updates, one [`Order`] per call of `handler`.
    ///
    /// `inst_type` may be [`InstrumentType::Any`]; narrow further with an
    /// instrument family or instrument ID.
    pub async fn subscribe_orders<F>(
        &self,
        inst_type: InstrumentType,
        inst_family: Option<&str>,
        inst_id: Option<&str>,
        mut handler: F,
    ) -> WsResult<SubscriptionHandle>
    where
        F: FnMut(Order) + Send + 'static,
    {
        let arg = orders_channel_arg(inst_type, inst_family, inst_id);
        self.subscribe(arg, move |frame| match frame.decode_data::<Order>() {
            Ok(orders) => orders.into_iter().for_each(&mut handler),
            Err(e) => tracing::warn!(error = %e, "Failed to decode order push"),
        })
        .await
    }
}

fn orders_channel_arg(
    inst_type: InstrumentType,
    inst_family: Option<&str>,
    inst_id: Option<&str>,
) -> ChannelArg {
    let mut arg = ChannelArg::new(ORDERS_CHANNEL).with_inst_type(inst_type.as_wire());
    if let Some(family) = inst_family {
        arg = arg.with_inst_family(family);
    }
    if let Some(id) = inst_id {
        arg = arg.with_inst_id(id);
    }
    arg
}
