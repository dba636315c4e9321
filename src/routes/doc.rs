use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        orders::{
            CheckoutItem, CheckoutRequest, CheckoutResponse, DeliverRequest, DeliveryLogList,
            DeliveryOutcome, OrderList, OrderWithItems,
        },
        products::ProductList,
        stock::{IngestResult, StockUploadForm},
        tickets::{RefundRequest, RefundResult},
        wallet::Balance,
    },
    models::{
        DeliveredItem, DeliveryLog, DeliveryStatus, Order, OrderItem, OrderStatus, Product, Role,
        TicketMessage, TicketStatus,
    },
    response::{ApiResponse, Meta},
    routes::{admin, health, orders, params, stock, tickets, wallet},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        orders::list_orders,
        orders::checkout,
        orders::deliver,
        orders::get_order,
        wallet::get_balance,
        stock::upload_stock,
        tickets::refund_ticket,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::list_delivery_logs,
        admin::list_low_stock,
        admin::reconcile_stock
    ),
    components(
        schemas(
            Role,
            OrderStatus,
            DeliveryStatus,
            TicketStatus,
            Product,
            Order,
            OrderItem,
            DeliveredItem,
            DeliveryLog,
            TicketMessage,
            CheckoutItem,
            CheckoutRequest,
            CheckoutResponse,
            DeliverRequest,
            DeliveryOutcome,
            OrderList,
            OrderWithItems,
            DeliveryLogList,
            ProductList,
            IngestResult,
            StockUploadForm,
            RefundRequest,
            RefundResult,
            Balance,
            admin::UpdateOrderStatusRequest,
            admin::LowStockQuery,
            params::Pagination,
            params::OrderListQuery,
            Meta,
            ApiResponse<CheckoutResponse>,
            ApiResponse<DeliveryOutcome>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<IngestResult>,
            ApiResponse<RefundResult>,
            ApiResponse<Balance>,
            ApiResponse<ProductList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Orders", description = "Checkout and delivery"),
        (name = "Wallet", description = "Customer balance"),
        (name = "Stock", description = "Stock uploads"),
        (name = "Tickets", description = "Support refunds"),
        (name = "Admin", description = "Back-office endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
