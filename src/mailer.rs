//! Outbound customer notifications.
//!
//! Delivery is always best-effort: callers run these from post-commit hooks and
//! only log failures.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct DeliveredLine {
    pub product_name: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderDeliveredEmail {
    pub to: String,
    pub name: String,
    pub order_id: Uuid,
    pub products: Vec<String>,
    pub stock_items: Vec<DeliveredLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TicketRepliedEmail {
    pub to: String,
    pub name: String,
    pub ticket_id: Uuid,
    pub subject: String,
    pub refunded: Option<Decimal>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_order_delivered(&self, email: &OrderDeliveredEmail) -> anyhow::Result<()>;

    async fn send_ticket_replied(&self, email: &TicketRepliedEmail) -> anyhow::Result<()>;
}

/// Writes notifications to the log instead of a mail relay.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_order_delivered(&self, email: &OrderDeliveredEmail) -> anyhow::Result<()> {
        tracing::info!(
            to = %email.to,
            order_id = %email.order_id,
            products = ?email.products,
            units = email.stock_items.len(),
            "order delivered email"
        );
        tracing::debug!(body = %render_order_delivered(email));
        Ok(())
    }

    async fn send_ticket_replied(&self, email: &TicketRepliedEmail) -> anyhow::Result<()> {
        tracing::info!(
            to = %email.to,
            ticket_id = %email.ticket_id,
            subject = %email.subject,
            refunded = ?email.refunded,
            "ticket replied email"
        );
        Ok(())
    }
}

/// Plain-text body for the delivery email, one block per delivered unit.
pub fn render_order_delivered(email: &OrderDeliveredEmail) -> String {
    let mut body = format!(
        "Hi {},\n\nYour order {} has been delivered.\n\n",
        email.name, email.order_id
    );
    for line in &email.stock_items {
        body.push_str(&format!("{}:\n{}\n\n", line.product_name, line.content));
    }
    body.push_str("Thank you for your purchase.\n");
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivered_body_lists_every_unit() {
        let email = OrderDeliveredEmail {
            to: "buyer@example.com".into(),
            name: "Buyer".into(),
            order_id: Uuid::nil(),
            products: vec!["PUBG Account".into()],
            stock_items: vec![
                DeliveredLine {
                    product_name: "PUBG Account".into(),
                    content: "user1:pass1".into(),
                },
                DeliveredLine {
                    product_name: "PUBG Account".into(),
                    content: "user2:pass2".into(),
                },
            ],
        };
        let body = render_order_delivered(&email);
        assert!(body.starts_with("Hi Buyer,"));
        assert!(body.contains("user1:pass1"));
        assert!(body.contains("user2:pass2"));
    }
}
