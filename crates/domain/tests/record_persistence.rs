//! Integration tests for domain records.
//!
//! These tests verify that sales, deliveries and stock entries survive a trip
//! through the record store and keep their stored shape.

use chrono::Utc;
use domain::{
    Article, ChauffeurId, ClientId, Delivery, DeliveryAssignment, DeliveryId, DeliveryStatus,
    DeliveryType, Discount, Money, PaymentMethod, Sale, SaleId, SaleItem, StockEntry,
};
use store::{InMemoryStore, RecordKey, RecordStore, RecordStoreExt, StoreError, Version};

fn assignment() -> DeliveryAssignment {
    DeliveryAssignment {
        chauffeur_id: ChauffeurId::new(),
        license: "123-TU-4567".to_string(),
        delivery_date: None,
    }
}

fn delivered_sale() -> (Sale, Delivery) {
    let now = Utc::now();
    let sale_id = SaleId::new();
    let delivery = Delivery::pending(DeliveryId::new(), sale_id, assignment(), now);
    let sale = Sale::new(
        sale_id,
        ClientId::new(),
        vec![
            SaleItem::new(domain::ArticleId::new(), 2, Money::from_cents(1250)),
            SaleItem::new(domain::ArticleId::new(), 1, Money::from_cents(4000))
                .with_discount(Discount::percent_of(10).unwrap()),
        ],
        PaymentMethod::BankTransfer,
        DeliveryType::Delivery,
        Some(delivery.id()),
        now,
    )
    .unwrap()
    .with_invoice(Some("F-0042".to_string()));

    (sale, delivery)
}

mod persistence {
    use super::*;

    #[tokio::test]
    async fn sale_and_delivery_round_trip_through_store() {
        let store = InMemoryStore::new();
        let (sale, delivery) = delivered_sale();

        let mut uow = store.begin();
        uow.put(&sale).unwrap();
        uow.put(&delivery).unwrap();
        assert_eq!(uow.commit().await.unwrap(), 2);

        let loaded_sale: Sale = store.fetch(sale.id()).await.unwrap().unwrap();
        let loaded_delivery: Delivery = store.fetch(delivery.id()).await.unwrap().unwrap();

        assert_eq!(loaded_sale, sale);
        assert_eq!(loaded_sale.total().cents(), 6100);
        assert_eq!(loaded_delivery, delivery);
        assert_eq!(loaded_delivery.sale_id(), Some(sale.id()));
    }

    #[tokio::test]
    async fn delivery_transitions_bump_record_version() {
        let store = InMemoryStore::new();
        let (_, mut delivery) = delivered_sale();
        let key = RecordKey::of::<Delivery>(delivery.id());

        let mut uow = store.begin();
        uow.put(&delivery).unwrap();
        uow.commit().await.unwrap();

        for step in [DeliveryStatus::InProgress, DeliveryStatus::Completed] {
            let mut uow = store.begin();
            let mut current: Delivery = uow.get(delivery.id()).await.unwrap().unwrap();
            match step {
                DeliveryStatus::InProgress => current.start(Utc::now()).unwrap(),
                _ => current.complete(Utc::now(), Some("left at door".into())).unwrap(),
            }
            uow.put(&current).unwrap();
            uow.commit().await.unwrap();
            delivery = current;
        }

        let stored = store.get(&key).await.unwrap().unwrap();
        assert_eq!(stored.version, Version::new(3));
        let loaded: Delivery = stored.decode().unwrap();
        assert_eq!(loaded.status(), DeliveryStatus::Completed);
        assert!(loaded.completion_date().is_some());
        assert_eq!(loaded, delivery);
    }

    #[tokio::test]
    async fn concurrent_sale_edits_conflict() {
        let store = InMemoryStore::new();
        let (sale, _) = delivered_sale();
        let mut uow = store.begin();
        uow.put(&sale).unwrap();
        uow.commit().await.unwrap();

        let mut first = store.begin();
        let mut second = store.begin();
        let mut a: Sale = first.get(sale.id()).await.unwrap().unwrap();
        let mut b: Sale = second.get(sale.id()).await.unwrap().unwrap();

        let items = a.items().to_vec();
        let delivery_id = sale.delivery_id();
        a.revise(
            items.clone(),
            Some(PaymentMethod::Cash),
            DeliveryType::Delivery,
            delivery_id,
            Utc::now(),
        )
        .unwrap();
        b.revise(
            items,
            Some(PaymentMethod::CreditCard),
            DeliveryType::Delivery,
            delivery_id,
            Utc::now(),
        )
        .unwrap();
        first.put(&a).unwrap();
        second.put(&b).unwrap();

        first.commit().await.unwrap();
        let result = second.commit().await;
        assert!(matches!(result, Err(StoreError::ConcurrencyConflict { .. })));

        let stored: Sale = store.fetch(sale.id()).await.unwrap().unwrap();
        assert_eq!(stored.payment_method(), PaymentMethod::Cash);
    }

    #[tokio::test]
    async fn ledger_and_mirror_share_the_article_id() {
        let store = InMemoryStore::new();
        let mut article =
            Article::new("CH-01", "Chair", Money::from_cents(2000), Money::from_cents(3500))
                .unwrap();
        let entry = StockEntry::new(article.id(), 12, Utc::now());
        article.sync_stock(&entry);

        let mut uow = store.begin();
        uow.put(&article).unwrap();
        uow.put(&entry).unwrap();
        uow.commit().await.unwrap();

        let article: Article = store.fetch(article.id()).await.unwrap().unwrap();
        let entry: StockEntry = store.fetch(article.id()).await.unwrap().unwrap();
        assert!(article.mirrors(&entry));
        assert_eq!(store.collection_len("articles").await, 1);
        assert_eq!(store.collection_len("stock_ledger").await, 1);
    }
}

mod stored_shape {
    use super::*;

    #[test]
    fn sale_serializes_enum_labels() {
        let (sale, delivery) = delivered_sale();
        let json = serde_json::to_value(&sale).unwrap();

        assert_eq!(json["payment_method"], "bank transfer");
        assert_eq!(json["delivery_type"], "Delivery");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["items"][1]["discount"], 10);
        assert_eq!(json["invoice"], "F-0042");

        let json = serde_json::to_value(&delivery).unwrap();
        assert_eq!(json["status"], "pending");
    }

    #[test]
    fn sale_item_discount_defaults_to_none() {
        let json = serde_json::json!({
            "article_id": domain::ArticleId::new(),
            "quantity": 3,
            "unit_price": { "cents": 250 },
        });

        let item: SaleItem = serde_json::from_value(json).unwrap();
        assert_eq!(item.discount, Discount::none());
        assert_eq!(item.line_total().unwrap().cents(), 750);
    }

    #[test]
    fn discount_above_hundred_is_rejected_on_read() {
        let json = serde_json::json!({
            "article_id": domain::ArticleId::new(),
            "quantity": 1,
            "unit_price": { "cents": 100 },
            "discount": 101,
        });

        assert!(serde_json::from_value::<SaleItem>(json).is_err());
    }
}
