use std::time::{SystemTime, UNIX_EPOCH};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::selection::{CaseType, Color, Patch};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub case_type: CaseType,
    pub color: Color,
    #[serde(default)]
    pub custom_text: String,
    #[serde(default)]
    pub selected_font: Option<String>,
    #[serde(default)]
    pub patches: Vec<Patch>,
    #[serde(default)]
    pub has_user_image: bool,
    /// Canvas capture as a data URL.
    #[serde(default)]
    pub screenshot: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("method {0:?} is not allowed")]
    MethodNotAllowed(Method),
    #[error("malformed order")]
    MalformedBody(#[from] serde_json::Error),
}

impl OrderError {
    pub fn status(&self) -> u16 {
        match self {
            OrderError::MethodNotAllowed(_) => 405,
            OrderError::MalformedBody(_) => 400,
        }
    }

    fn response(&self) -> OrderResponse {
        let message = match self {
            OrderError::MethodNotAllowed(_) => "Method not allowed".to_string(),
            OrderError::MalformedBody(err) => format!("Malformed order: {}", err),
        };

        OrderResponse {
            success: false,
            message,
            order_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedOrder {
    pub order_id: String,
    pub request: OrderRequest,
}

/// Mock order endpoint. Orders are logged and kept in memory, nothing else.
pub struct OrderDesk {
    studio_name: String,
    orders: Vec<PlacedOrder>,
}

impl OrderDesk {
    pub fn new(studio_name: impl Into<String>) -> Self {
        Self {
            studio_name: studio_name.into(),
            orders: Vec::new(),
        }
    }

    /// Handles one request and returns `(status, response)` as the endpoint would.
    pub fn handle(&mut self, method: Method, body: &str) -> (u16, OrderResponse) {
        match self.try_handle(method, body) {
            Ok(response) => (200, response),
            Err(err) => {
                warn!("Rejected order: {}", err);
                (err.status(), err.response())
            }
        }
    }

    fn try_handle(&mut self, method: Method, body: &str) -> Result<OrderResponse, OrderError> {
        if method != Method::Post {
            return Err(OrderError::MethodNotAllowed(method));
        }

        let request: OrderRequest = serde_json::from_str(body)?;
        Ok(self.place(request))
    }

    pub fn place(&mut self, request: OrderRequest) -> OrderResponse {
        let order_id = self.next_order_id();

        info!("New order {}", order_id);
        info!("  case type: {}", request.case_type);
        info!("  color: {}", request.color);
        info!(
            "  text: {}",
            if request.custom_text.is_empty() {
                "<none>"
            } else {
                request.custom_text.as_str()
            }
        );
        info!("  patches: {}", request.patches.len());
        info!("  user image: {}", if request.has_user_image { "yes" } else { "no" });

        self.orders.push(PlacedOrder {
            order_id: order_id.clone(),
            request,
        });

        OrderResponse {
            success: true,
            message: format!("Order received. {} has your customization.", self.studio_name),
            order_id: Some(order_id),
        }
    }

    fn next_order_id(&self) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default();

        let mut order_id = format!("ORD-{}", millis);
        // Two orders in the same millisecond still get distinct ids.
        let mut suffix = 1;
        while self.orders.iter().any(|order| order.order_id == order_id) {
            order_id = format!("ORD-{}-{}", millis, suffix);
            suffix += 1;
        }
        order_id
    }

    pub fn orders(&self) -> &[PlacedOrder] {
        &self.orders
    }
}
