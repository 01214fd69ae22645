//! Query tests against a throwaway database provisioned by `sqlx::test`.

use catalog_core::{normalize_variants, NormalizedVariant, NumberField, VariantInput};
use catalog_db::{
    category_slug_exists, create_category, create_product, delete_product,
    get_category_by_public_id, get_product_by_public_id, list_categories, list_products,
    list_variants_for_products, product_slug_exists, update_product, DbError, NewCategory,
    NewProduct, ProductListFilters, ProductUpdate,
};
use rust_decimal::Decimal;
use sqlx::PgPool;

fn variant(size: &str, color: &str, sku: &str, stock: f64) -> VariantInput {
    VariantInput {
        size: Some(size.to_string()),
        color: Some(color.to_string()),
        sku: Some(sku.to_string()),
        stock: Some(NumberField::Number(stock)),
        ..VariantInput::default()
    }
}

async fn seed_category(pool: &PgPool, slug: &str) -> (i64, uuid::Uuid) {
    let row = create_category(
        pool,
        &NewCategory {
            name: slug,
            slug,
            description: None,
            parent_id: None,
        },
    )
    .await
    .expect("create category");
    (row.id, row.public_id)
}

fn new_product<'a>(slug: &'a str, category_id: i64, brand: Option<&'a str>) -> NewProduct<'a> {
    NewProduct {
        name: slug,
        slug,
        description: None,
        images: &[],
        price: 19.99,
        category_id,
        brand,
        ratings_average: 0.0,
        ratings_count: 0,
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn categories_resolve_parent_public_id(pool: PgPool) {
    let (parent_id, parent_public_id) = seed_category(&pool, "phones").await;
    let child = create_category(
        &pool,
        &NewCategory {
            name: "Apple",
            slug: "apple",
            description: Some("Apple phones"),
            parent_id: Some(parent_id),
        },
    )
    .await
    .expect("create child");

    assert!(child.is_subcategory());
    assert_eq!(child.parent_public_id, Some(parent_public_id));

    let fetched = get_category_by_public_id(&pool, child.public_id)
        .await
        .expect("query")
        .expect("child exists");
    assert_eq!(fetched.slug, "apple");

    let names: Vec<String> = list_categories(&pool)
        .await
        .expect("list")
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Apple".to_string(), "phones".to_string()]);

    assert!(category_slug_exists(&pool, "phones").await.expect("exists"));
    assert!(!category_slug_exists(&pool, "tablets").await.expect("exists"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn duplicate_category_slug_is_a_unique_violation(pool: PgPool) {
    seed_category(&pool, "phones").await;
    let err = create_category(
        &pool,
        &NewCategory {
            name: "Phones again",
            slug: "phones",
            description: None,
            parent_id: None,
        },
    )
    .await
    .expect_err("duplicate slug");
    assert!(err.is_unique_violation());
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_product_persists_variants_in_order(pool: PgPool) {
    let (category_id, category_public_id) = seed_category(&pool, "shirts").await;
    let inputs = vec![
        variant("M", "Red", "TS-M-R", 5.0),
        variant("L", "Red", "TS-L-R", 0.0),
    ];
    let variants: Vec<NormalizedVariant> = normalize_variants(Some(inputs.as_slice()));

    let (product, rows) = create_product(&pool, &new_product("tee", category_id, None), &variants)
        .await
        .expect("create product");

    assert_eq!(product.category_public_id, category_public_id);
    assert_eq!(product.price, Decimal::new(1999, 2));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].sku.as_deref(), Some("TS-M-R"));
    assert_eq!(rows[1].position, 1);

    let listed = list_variants_for_products(&pool, &[product.id])
        .await
        .expect("list variants");
    assert_eq!(listed.len(), 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_products_filters_and_counts(pool: PgPool) {
    let (category_id, category_public_id) = seed_category(&pool, "phones").await;
    for (slug, brand) in [("iphone-15", "Apple"), ("galaxy-s24", "Samsung"), ("pixel-9", "Google")] {
        create_product(&pool, &new_product(slug, category_id, Some(brand)), &[])
            .await
            .expect("create product");
    }

    let (rows, total) = list_products(
        &pool,
        &ProductListFilters {
            brand: Some("apple".to_string()),
            limit: 10,
            ..ProductListFilters::default()
        },
    )
    .await
    .expect("list by brand");
    assert_eq!(total, 1);
    assert_eq!(rows[0].slug, "iphone-15");

    let (rows, total) = list_products(
        &pool,
        &ProductListFilters {
            category_public_id: Some(category_public_id),
            limit: 2,
            offset: 0,
            ..ProductListFilters::default()
        },
    )
    .await
    .expect("list page");
    assert_eq!(total, 3);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].slug, "pixel-9", "newest product comes first");

    let (_, total) = list_products(
        &pool,
        &ProductListFilters {
            search: Some("100%".to_string()),
            limit: 10,
            ..ProductListFilters::default()
        },
    )
    .await
    .expect("list with wildcard search");
    assert_eq!(total, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn prices_are_stored_without_rounding_or_overflow(pool: PgPool) {
    let (category_id, _) = seed_category(&pool, "watches").await;
    let mut priced = normalize_variants(Some(&[variant("M", "Gold", "W-1", 1.0)][..]));
    priced[0].price = Some(123_456_789.125);

    let mut product = new_product("watch", category_id, None);
    product.price = 19.999;

    let (created, rows) = create_product(&pool, &product, &priced)
        .await
        .expect("create product");
    assert_eq!(created.price, Decimal::new(19_999, 3));
    assert_eq!(rows[0].price, Some(Decimal::new(123_456_789_125, 3)));

    let fetched = list_variants_for_products(&pool, &[created.id])
        .await
        .expect("list variants");
    assert_eq!(fetched[0].price, Some(Decimal::new(123_456_789_125, 3)));

    let (updated, _) = update_product(
        &pool,
        created.id,
        &ProductUpdate {
            price: Some(1e9),
            ..ProductUpdate::default()
        },
    )
    .await
    .expect("large price update");
    assert_eq!(updated.price, Decimal::new(1_000_000_000, 0));
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_product_replaces_variants_only_when_supplied(pool: PgPool) {
    let (category_id, _) = seed_category(&pool, "shirts").await;
    let first = normalize_variants(Some(&[variant("M", "Red", "A", 1.0)][..]));
    let (product, _) = create_product(&pool, &new_product("tee", category_id, Some("Acme")), &first)
        .await
        .expect("create product");

    let (updated, variants) = update_product(
        &pool,
        product.id,
        &ProductUpdate {
            name: Some("Tee"),
            brand: Some(None),
            ..ProductUpdate::default()
        },
    )
    .await
    .expect("rename");
    assert_eq!(updated.name, "Tee");
    assert!(updated.brand.is_none());
    assert_eq!(variants.len(), 1);

    let replacement = normalize_variants(Some(
        &[variant("S", "Blue", "B", 2.0), variant("L", "Blue", "C", 3.0)][..],
    ));
    let (_, variants) = update_product(
        &pool,
        product.id,
        &ProductUpdate {
            variants: Some(replacement.as_slice()),
            ..ProductUpdate::default()
        },
    )
    .await
    .expect("replace variants");
    let skus: Vec<_> = variants.iter().filter_map(|v| v.sku.clone()).collect();
    assert_eq!(skus, vec!["B".to_string(), "C".to_string()]);

    assert!(product_slug_exists(&pool, "tee", None).await.expect("exists"));
    assert!(!product_slug_exists(&pool, "tee", Some(product.id))
        .await
        .expect("exists"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn delete_product_reports_missing_rows(pool: PgPool) {
    let (category_id, _) = seed_category(&pool, "mugs").await;
    let (product, _) = create_product(&pool, &new_product("mug", category_id, None), &[])
        .await
        .expect("create product");

    delete_product(&pool, product.public_id)
        .await
        .expect("delete product");
    assert!(get_product_by_public_id(&pool, product.public_id)
        .await
        .expect("query")
        .is_none());

    let err = delete_product(&pool, product.public_id)
        .await
        .expect_err("second delete");
    assert!(matches!(err, DbError::NotFound));
}
