//! Live integration tests for catalog-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database. The `migrations`
//! path is relative to the crate root (`crates/catalog-db/`).

use catalog_core::{
    Attributes, CategoryPath, CategorySeed, ImageSet, ModelDescription, NewProduct, Product,
    ProductPatch,
};
use catalog_db::{
    count_representatives, create_category, create_product, delete_product, get_image_set,
    get_model_description, get_product_by_sku, get_variant_fields, list_categories,
    list_image_sets, list_products_by_level2, list_products_by_skus, list_representatives,
    rename_level0, search_representatives, seed_categories, update_product, upsert_image_set,
    upsert_model_description, DbError, ProductFilter,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_product(sku: &str, brand: &str, level2: &str) -> NewProduct {
    NewProduct {
        sku: sku.to_string(),
        name: format!("{level2} {sku}"),
        brand: brand.to_string(),
        level0: "Smartphones".to_string(),
        level1: Some("Flagships".to_string()),
        level2: Some(level2.to_string()),
        attributes: Attributes::default(),
        images: Vec::new(),
        image_url: None,
        stock: 5,
        is_available: true,
    }
}

async fn insert(pool: &sqlx::PgPool, product: NewProduct) -> Product {
    let sku = product.sku.clone();
    create_product(pool, &product)
        .await
        .unwrap_or_else(|e| panic!("create_product failed for '{sku}': {e}"))
        .into()
}

// ---------------------------------------------------------------------------
// products
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn duplicate_sku_is_rejected_and_original_kept(pool: sqlx::PgPool) {
    insert(&pool, new_product("IP16-128-BLK", "Apple", "iPhone 16")).await;

    let mut dup = new_product("IP16-128-BLK", "Other", "Other Model");
    dup.name = "Impostor".to_string();
    let err = create_product(&pool, &dup).await.unwrap_err();
    assert!(matches!(err, DbError::DuplicateSku(ref sku) if sku == "IP16-128-BLK"));

    let stored: Product = get_product_by_sku(&pool, "IP16-128-BLK")
        .await
        .expect("query")
        .expect("product exists")
        .into();
    assert_eq!(stored.brand, "Apple");
    assert_ne!(stored.name, "Impostor");
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_product_changes_only_supplied_fields(pool: sqlx::PgPool) {
    let mut product = new_product("MBA-M2-256", "Apple", "MacBook Air M2");
    product.image_url = Some("https://cdn.example.com/mba.jpg".to_string());
    product.attributes.color = Some("Midnight".to_string());
    insert(&pool, product).await;

    let patch = ProductPatch {
        stock: Some(0),
        is_available: Some(false),
        image_url: Some(None),
        ..ProductPatch::default()
    };
    let updated: Product = update_product(&pool, "MBA-M2-256", &patch)
        .await
        .expect("update")
        .into();

    assert_eq!(updated.stock, 0);
    assert!(!updated.is_available);
    assert!(updated.image_url.is_none());
    assert_eq!(updated.brand, "Apple");
    assert_eq!(updated.level2.as_deref(), Some("MacBook Air M2"));
    assert_eq!(updated.attributes.color.as_deref(), Some("Midnight"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_unknown_sku_is_not_found(pool: sqlx::PgPool) {
    let err = update_product(&pool, "MISSING", &ProductPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound));
}

#[sqlx::test(migrations = "../../migrations")]
async fn delete_product_reports_not_found(pool: sqlx::PgPool) {
    insert(&pool, new_product("DEL-1", "Apple", "iPhone 16")).await;

    let mut conn = pool.acquire().await.expect("conn");
    delete_product(&mut conn, "DEL-1").await.expect("delete");
    let err = delete_product(&mut conn, "DEL-1").await.unwrap_err();
    assert!(matches!(err, DbError::NotFound));
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_representatives_returns_one_per_model_and_brand(pool: sqlx::PgPool) {
    let first = insert(&pool, new_product("MBA-M2-256", "Apple", "MacBook Air M2")).await;
    insert(&pool, new_product("MBA-M2-512", "Apple", "MacBook Air M2")).await;
    insert(&pool, new_product("PX9-128", "Google", "Pixel 9")).await;
    insert(&pool, new_product("PX9-REF", "Refurb Co", "Pixel 9")).await;

    let all = list_representatives(&pool, ProductFilter::default(), 0, 50)
        .await
        .expect("list");
    assert_eq!(all.len(), 3);
    let skus: Vec<&str> = all.iter().map(|r| r.sku.as_str()).collect();
    assert_eq!(skus, vec!["MBA-M2-256", "PX9-128", "PX9-REF"]);

    let filtered = list_representatives(
        &pool,
        ProductFilter {
            brand: Some("Apple"),
            level2: Some("MacBook Air M2"),
            ..ProductFilter::default()
        },
        0,
        50,
    )
    .await
    .expect("filtered list");
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id, first.id);

    let total = count_representatives(&pool, ProductFilter::default())
        .await
        .expect("count");
    assert_eq!(total, 3);
}

#[sqlx::test(migrations = "../../migrations")]
async fn pagination_applies_after_grouping(pool: sqlx::PgPool) {
    for (sku, level2) in [
        ("A-1", "Alpha"),
        ("A-2", "Alpha"),
        ("B-1", "Beta"),
        ("B-2", "Beta"),
        ("C-1", "Gamma"),
    ] {
        insert(&pool, new_product(sku, "Apple", level2)).await;
    }

    let page = list_representatives(&pool, ProductFilter::default(), 1, 1)
        .await
        .expect("page");
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].sku, "B-1");

    let tail = list_representatives(&pool, ProductFilter::default(), 2, 10)
        .await
        .expect("tail");
    assert_eq!(tail.len(), 1);
    assert_eq!(tail[0].sku, "C-1");
}

#[sqlx::test(migrations = "../../migrations")]
async fn search_is_case_insensitive_grouped_and_name_descending(pool: sqlx::PgPool) {
    let mut a = new_product("IP16-128", "Apple", "iPhone 16");
    a.name = "Apple iPhone 16 128GB".to_string();
    let mut b = new_product("IP16-256", "Apple", "iPhone 16");
    b.name = "Apple iPhone 16 256GB".to_string();
    let mut c = new_product("IP16P-256", "Apple", "iPhone 16 Pro");
    c.name = "Apple iPhone 16 Pro 256GB".to_string();
    let mut d = new_product("GS24", "Samsung", "Galaxy S24");
    d.name = "Samsung Galaxy S24".to_string();
    for p in [a, b, c, d] {
        insert(&pool, p).await;
    }

    let rows = search_representatives(&pool, "IPHONE", 20)
        .await
        .expect("search");
    let skus: Vec<&str> = rows.iter().map(|r| r.sku.as_str()).collect();
    assert_eq!(skus, vec!["IP16P-256", "IP16-128"]);

    let none = search_representatives(&pool, "100%", 20)
        .await
        .expect("search");
    assert!(none.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn lookups_by_level2_and_skus(pool: sqlx::PgPool) {
    insert(&pool, new_product("MBA-M2-256", "Apple", "MacBook Air M2")).await;
    insert(&pool, new_product("MBA-M2-512", "Apple", "MacBook Air M2")).await;
    insert(&pool, new_product("IP16-128", "Apple", "iPhone 16")).await;

    let by_model = list_products_by_level2(&pool, "MacBook Air M2")
        .await
        .expect("by level2");
    assert_eq!(by_model.len(), 2);

    let by_sku = list_products_by_skus(&pool, &["IP16-128".to_string(), "NOPE".to_string()])
        .await
        .expect("by skus");
    assert_eq!(by_sku.len(), 1);
}

// ---------------------------------------------------------------------------
// image sets & descriptions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn image_set_upsert_matches_normalized_color(pool: sqlx::PgPool) {
    upsert_image_set(
        &pool,
        &ImageSet {
            level2: "iPhone 16 Pro".to_string(),
            color: "Titanium Black".to_string(),
            images: vec!["https://cdn.example.com/1.jpg".to_string()],
        },
    )
    .await
    .expect("insert");

    upsert_image_set(
        &pool,
        &ImageSet {
            level2: "iPhone 16 Pro".to_string(),
            color: "titanium-black".to_string(),
            images: vec!["https://cdn.example.com/2.jpg".to_string()],
        },
    )
    .await
    .expect("replace");

    let sets = list_image_sets(&pool, Some("iPhone 16 Pro"))
        .await
        .expect("list");
    assert_eq!(sets.len(), 1);

    let found: ImageSet = get_image_set(&pool, "iPhone 16 Pro", "TITANIUM BLACK")
        .await
        .expect("get")
        .expect("exists")
        .into();
    assert_eq!(found.images, vec!["https://cdn.example.com/2.jpg"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn model_description_upsert_replaces(pool: sqlx::PgPool) {
    let mut desc = ModelDescription {
        level2: "iPhone 16".to_string(),
        description: "First".to_string(),
        details: serde_json::json!({ "chip": "A18" }),
    };
    upsert_model_description(&pool, &desc).await.expect("insert");
    desc.description = "Second".to_string();
    upsert_model_description(&pool, &desc).await.expect("update");

    let stored: ModelDescription = get_model_description(&pool, "iPhone 16")
        .await
        .expect("get")
        .expect("exists")
        .into();
    assert_eq!(stored.description, "Second");
    assert_eq!(stored.details["chip"], "A18");
}

// ---------------------------------------------------------------------------
// categories
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn create_category_rejects_duplicate_path(pool: sqlx::PgPool) {
    let path = CategoryPath::new("Laptops", Some("MacBook Air"), None);
    create_category(&pool, &path, None, None)
        .await
        .expect("first create");
    let err = create_category(&pool, &path, Some("again"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Conflict(_)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn seed_categories_is_idempotent(pool: sqlx::PgPool) {
    let seeds = vec![
        CategorySeed {
            path: CategoryPath::new("Laptops", None, None),
            description: Some("Portable computers".to_string()),
            icon: None,
            variant_fields: vec!["color".to_string(), "disk".to_string()],
        },
        CategorySeed {
            path: CategoryPath::new("Laptops", Some("MacBook Air"), None),
            description: None,
            icon: None,
            variant_fields: Vec::new(),
        },
    ];

    assert_eq!(seed_categories(&pool, &seeds).await.expect("seed"), 2);
    assert_eq!(seed_categories(&pool, &seeds).await.expect("reseed"), 2);

    let rows = list_categories(&pool).await.expect("list");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].description.as_deref(), Some("Portable computers"));

    let fields: catalog_core::VariantFields = get_variant_fields(&pool, "Laptops")
        .await
        .expect("get")
        .expect("exists")
        .into();
    assert_eq!(fields.fields, vec!["color", "disk"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn rename_level0_cascades(pool: sqlx::PgPool) {
    insert(&pool, new_product("IP16-128", "Apple", "iPhone 16")).await;
    insert(&pool, new_product("IP16-256", "Apple", "iPhone 16")).await;
    seed_categories(
        &pool,
        &[CategorySeed {
            path: CategoryPath::new("Smartphones", None, None),
            description: None,
            icon: None,
            variant_fields: vec!["color".to_string()],
        }],
    )
    .await
    .expect("seed");

    let report = rename_level0(&pool, "Smartphones", "Phones")
        .await
        .expect("rename");
    assert_eq!(report.products, 2);
    assert_eq!(report.categories, 1);
    assert_eq!(report.variant_fields, 1);

    let product: Product = get_product_by_sku(&pool, "IP16-128")
        .await
        .expect("get")
        .expect("exists")
        .into();
    assert_eq!(product.level0, "Phones");

    let err = rename_level0(&pool, "Smartphones", "Phones")
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound));
}
