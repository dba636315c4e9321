use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;
use vaultshop_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    middleware::auth::Claims,
    models::Role,
    services::inventory_service::ingest_lines,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&orm, "admin@example.com", "Admin", Role::Admin, Decimal::ZERO).await?;
    let user_id = ensure_user(&orm, "user@example.com", "Demo User", Role::User, Decimal::new(50000, 2)).await?;
    seed_products(&orm).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    println!("Admin token: Bearer {}", mint_token(&config, admin_id, Role::Admin)?);
    println!("User token:  Bearer {}", mint_token(&config, user_id, Role::User)?);
    Ok(())
}

async fn ensure_user(
    orm: &DatabaseConnection,
    email: &str,
    name: &str,
    role: Role,
    balance: Decimal,
) -> anyhow::Result<Uuid> {
    Users::insert(UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        name: Set(name.to_string()),
        balance: Set(balance),
        role: Set(role.to_string()),
        created_at: NotSet,
    })
    .on_conflict(
        OnConflict::column(UserCol::Email)
            .update_column(UserCol::Role)
            .to_owned(),
    )
    .exec_without_returning(orm)
    .await?;

    // If user already exists, fetch id
    let user = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("user {email} missing after upsert"))?;

    println!("Ensured user {email} (role={role})");
    Ok(user.id)
}

async fn seed_products(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let products = [
        ("PUBG Mobile Account (Level 50+)", "pubg-mobile-level-50", Decimal::new(6000, 2), "pubg"),
        ("PUBG Mobile Account (Conqueror)", "pubg-mobile-conqueror", Decimal::new(45000, 2), "pubg-conq"),
        ("Valorant Account (Immortal)", "valorant-immortal", Decimal::new(32000, 2), "valo-imm"),
        ("Valorant Account (Fresh Level 20)", "valorant-level-20", Decimal::new(2500, 2), "valo-l20"),
    ];

    for (name, slug, price, prefix) in products {
        Products::insert(ProductActive {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            slug: Set(slug.to_string()),
            price: Set(price),
            stock_count: Set(0),
            category_id: Set(None),
            created_at: NotSet,
        })
        .on_conflict(OnConflict::column(ProdCol::Slug).do_nothing().to_owned())
        .exec_without_returning(orm)
        .await?;

        let product = Products::find()
            .filter(ProdCol::Slug.eq(slug))
            .one(orm)
            .await?
            .ok_or_else(|| anyhow::anyhow!("product {slug} missing after insert"))?;

        let lines: Vec<String> = (1..=5)
            .map(|n| format!("{prefix}-user{n}@mail.test:Pass{n}!{prefix}"))
            .collect();
        let result = ingest_lines(orm, product.id, &lines).await?;
        println!("Seeded {name}: {} units added", result.added);
    }

    Ok(())
}

fn mint_token(config: &AppConfig, user_id: Uuid, role: Role) -> anyhow::Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| anyhow::anyhow!("Failed to set expiration"))?;
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp: expiration.timestamp() as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )?;
    Ok(token)
}
