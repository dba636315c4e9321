#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;
use vaultshop_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{
        delivery_logs::{Column as DeliveryLogCol, Entity as DeliveryLogs, Model as DeliveryLogModel},
        orders::ActiveModel as OrderActive,
        products::{ActiveModel as ProductActive, Entity as Products},
        stock::{Column as StockCol, Entity as Stock, Model as StockModel},
        tickets::ActiveModel as TicketActive,
        users::{ActiveModel as UserActive, Entity as Users},
    },
    mailer::{Mailer, OrderDeliveredEmail, TicketRepliedEmail},
    middleware::auth::AuthUser,
    models::{DeliveryStatus, OrderStatus, Role, TicketStatus},
    state::AppState,
};

/// Captures every notification instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    pub delivered: Mutex<Vec<OrderDeliveredEmail>>,
    pub replied: Mutex<Vec<TicketRepliedEmail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_order_delivered(&self, email: &OrderDeliveredEmail) -> anyhow::Result<()> {
        self.delivered.lock().unwrap().push(email.clone());
        Ok(())
    }

    async fn send_ticket_replied(&self, email: &TicketRepliedEmail) -> anyhow::Result<()> {
        self.replied.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// A mail relay that is always down.
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send_order_delivered(&self, _email: &OrderDeliveredEmail) -> anyhow::Result<()> {
        anyhow::bail!("smtp relay unavailable")
    }

    async fn send_ticket_replied(&self, _email: &TicketRepliedEmail) -> anyhow::Result<()> {
        anyhow::bail!("smtp relay unavailable")
    }
}

/// A mail relay that answers, but only after `delay`.
pub struct SlowMailer {
    pub delay: Duration,
}

#[async_trait]
impl Mailer for SlowMailer {
    async fn send_order_delivered(&self, _email: &OrderDeliveredEmail) -> anyhow::Result<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn send_ticket_replied(&self, _email: &TicketRepliedEmail) -> anyhow::Result<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

/// Allow skipping when no DB is configured in the environment.
pub fn database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration tests.");
            None
        }
    }
}

pub async fn setup_state(database_url: &str, mailer: Arc<dyn Mailer>) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    let config = AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        tx_timeout: Duration::from_secs(10),
        max_upload_bytes: 1024 * 1024,
    };
    Ok(AppState::new(orm, mailer, &config))
}

pub async fn create_user(state: &AppState, role: Role, balance: Decimal) -> anyhow::Result<AuthUser> {
    let id = Uuid::new_v4();
    UserActive {
        id: Set(id),
        email: Set(format!("{id}@example.com")),
        name: Set("Test Buyer".into()),
        balance: Set(balance),
        role: Set(role.to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser { user_id: id, role })
}

pub async fn create_product(state: &AppState, price: Decimal) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    ProductActive {
        id: Set(id),
        name: Set(format!("PUBG Account {}", &id.to_string()[..8])),
        slug: Set(format!("pubg-{id}")),
        price: Set(price),
        stock_count: Set(0),
        category_id: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(id)
}

/// A paid, undelivered order with no line items.
pub async fn create_order(state: &AppState, user_id: Uuid) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    OrderActive {
        id: Set(id),
        user_id: Set(user_id),
        total_amount: Set(Decimal::ZERO),
        status: Set(OrderStatus::Completed.to_string()),
        delivery_status: Set(DeliveryStatus::Pending.to_string()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(id)
}

pub async fn create_ticket(state: &AppState, owner: Uuid, status: TicketStatus) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    TicketActive {
        id: Set(id),
        user_id: Set(owner),
        subject: Set("Account credentials do not work".into()),
        status: Set(status.to_string()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(id)
}

pub async fn balance(state: &AppState, user_id: Uuid) -> anyhow::Result<Decimal> {
    let user = Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("user missing"))?;
    Ok(user.balance)
}

pub async fn stock_count(state: &AppState, product_id: Uuid) -> anyhow::Result<i32> {
    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product missing"))?;
    Ok(product.stock_count)
}

pub async fn stock_rows(state: &AppState, product_id: Uuid) -> anyhow::Result<Vec<StockModel>> {
    Ok(Stock::find()
        .filter(StockCol::ProductId.eq(product_id))
        .all(&state.orm)
        .await?)
}

pub async fn delivery_logs(state: &AppState, order_id: Uuid) -> anyhow::Result<Vec<DeliveryLogModel>> {
    Ok(DeliveryLogs::find()
        .filter(DeliveryLogCol::OrderId.eq(order_id))
        .all(&state.orm)
        .await?)
}

/// Builds an uploaded stock file, one credential per line.
pub fn stock_file(items: &[&str]) -> String {
    items.join("\n")
}
