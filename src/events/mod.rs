use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Which stock-keeping table an item lives in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum StockItemKind {
    Product,
    Part,
}

impl std::fmt::Display for StockItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockItemKind::Product => write!(f, "product"),
            StockItemKind::Part => write!(f, "part"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is closed.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(error = %e, "Dropping domain event");
        }
    }
}

/// Domain events raised after a unit of work commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    OrderCreated {
        order_id: i32,
        customer_id: i32,
    },
    OrderUpdated {
        order_id: i32,
    },
    OrderDeleted {
        order_id: i32,
    },
    StockReplenished {
        kind: StockItemKind,
        item_id: i32,
        quantity: i32,
        new_stock: i32,
        reason: Option<String>,
    },
    LowStock {
        product_id: i32,
        remaining: i32,
    },
}

/// Consumes domain events until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::OrderCreated {
                order_id,
                customer_id,
            } => info!(order_id, customer_id, "Order created"),
            Event::OrderUpdated { order_id } => info!(order_id, "Order updated"),
            Event::OrderDeleted { order_id } => info!(order_id, "Order deleted"),
            Event::StockReplenished {
                kind,
                item_id,
                quantity,
                new_stock,
                reason,
            } => info!(
                kind = %kind,
                item_id,
                quantity,
                new_stock,
                reason = reason.as_deref().unwrap_or("-"),
                "Stock replenished"
            ),
            Event::LowStock {
                product_id,
                remaining,
            } => warn!(product_id, remaining, "Product stock is running low"),
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sender_delivers_events_in_order() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);

        sender
            .send(Event::OrderCreated {
                order_id: 1,
                customer_id: 7,
            })
            .await
            .unwrap();
        sender.send(Event::OrderDeleted { order_id: 1 }).await.unwrap();

        assert_eq!(
            rx.recv().await,
            Some(Event::OrderCreated {
                order_id: 1,
                customer_id: 7
            })
        );
        assert_eq!(rx.recv().await, Some(Event::OrderDeleted { order_id: 1 }));
    }

    #[tokio::test]
    async fn send_fails_once_receiver_is_gone() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        assert!(sender.send(Event::OrderUpdated { order_id: 3 }).await.is_err());
        // must not panic
        sender.send_or_log(Event::OrderUpdated { order_id: 3 }).await;
    }

    #[tokio::test]
    async fn processing_loop_ends_when_senders_drop() {
        let (tx, rx) = mpsc::channel(4);
        let handle = tokio::spawn(process_events(rx));
        tx.send(Event::LowStock {
            product_id: 2,
            remaining: 1,
        })
        .await
        .unwrap();
        drop(tx);
        handle.await.unwrap();
    }
}
