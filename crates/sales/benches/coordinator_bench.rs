use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    Article, ArticleId, ClientId, CreateSale, DeleteSale, DeliverySpec, Money, SaleItem,
    UpdateSale,
};
use sales::{CoordinatorConfig, InMemoryPartyDirectory, SaleCoordinator};
use store::InMemoryStore;

type Coordinator = SaleCoordinator<InMemoryStore, InMemoryPartyDirectory>;

fn seeded(rt: &tokio::runtime::Runtime, articles: usize) -> (Coordinator, ClientId, Vec<ArticleId>) {
    let directory = InMemoryPartyDirectory::new();
    let client_id = directory.add_client();
    let coordinator = SaleCoordinator::new(
        InMemoryStore::new(),
        directory,
        CoordinatorConfig::default(),
    );

    let article_ids = rt.block_on(async {
        let mut ids = Vec::with_capacity(articles);
        for n in 0..articles {
            let article = Article::new(
                format!("SKU-{n:03}"),
                format!("Product {n}"),
                Money::from_cents(500),
                Money::from_cents(900),
            )
            .unwrap();
            ids.push(
                coordinator
                    .register_article(article, u32::MAX / 2)
                    .await
                    .unwrap()
                    .id(),
            );
        }
        ids
    });

    (coordinator, client_id, article_ids)
}

fn lines(article_ids: &[ArticleId], quantity: u32) -> Vec<SaleItem> {
    article_ids
        .iter()
        .map(|&id| SaleItem::new(id, quantity, Money::from_cents(900)))
        .collect()
}

fn bench_create_sale(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (coordinator, client_id, article_ids) = seeded(&rt, 5);

    c.bench_function("sales/create_sale_5_lines", |b| {
        b.iter(|| {
            rt.block_on(async {
                let cmd = CreateSale::new(client_id, lines(&article_ids, 1), DeliverySpec::in_store());
                coordinator.create_sale(cmd).await.unwrap();
            });
        });
    });
}

fn bench_create_delete_round_trip(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (coordinator, client_id, article_ids) = seeded(&rt, 5);

    c.bench_function("sales/create_then_delete", |b| {
        b.iter(|| {
            rt.block_on(async {
                let cmd = CreateSale::new(client_id, lines(&article_ids, 2), DeliverySpec::pickup());
                let sale = coordinator.create_sale(cmd).await.unwrap().sale;
                coordinator
                    .delete_sale(DeleteSale::new(sale.id()))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_update_sale(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (coordinator, client_id, article_ids) = seeded(&rt, 10);
    let sale_id = rt.block_on(async {
        let cmd = CreateSale::new(client_id, lines(&article_ids[..5], 1), DeliverySpec::in_store());
        coordinator.create_sale(cmd).await.unwrap().sale.id()
    });

    c.bench_function("sales/update_sale_swap_lines", |b| {
        let mut flip = false;
        b.iter(|| {
            flip = !flip;
            let half = if flip { &article_ids[5..] } else { &article_ids[..5] };
            rt.block_on(async {
                coordinator
                    .update_sale(UpdateSale::new(sale_id, lines(half, 1), DeliverySpec::in_store()))
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_create_sale,
    bench_create_delete_round_trip,
    bench_update_sale,
);
criterion_main!(benches);
