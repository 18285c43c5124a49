// src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;
#[cfg(test)]
mod test_support;

use crate::config::AppState;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() {
    // Inicializa o logger
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app = build_router(app_state);

    // Inicia o servidor
    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}

// Monta o router completo.
fn build_router(app_state: AppState) -> Router {
    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Rotas de usuário (protegidas pelo middleware)
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let site_routes = Router::new()
        .route(
            "/sites/",
            get(handlers::sites::list_sites).post(handlers::sites::create_site),
        )
        .route(
            "/mechanics/",
            get(handlers::sites::list_mechanics).post(handlers::sites::create_mechanic),
        );

    let crm_routes = Router::new()
        .route(
            "/customers/",
            get(handlers::crm::list_customers).post(handlers::crm::create_customer),
        )
        .route("/customers/{id}/", get(handlers::crm::get_customer))
        .route(
            "/vehicles/",
            get(handlers::crm::list_vehicles).post(handlers::crm::create_vehicle),
        )
        .route("/vehicles/{id}/", get(handlers::crm::get_vehicle));

    let inventory_routes = Router::new()
        .route(
            "/products/",
            get(handlers::inventory::list_products).post(handlers::inventory::create_product),
        )
        .route(
            "/inventory/",
            get(handlers::inventory::list_inventory).post(handlers::inventory::create_inventory),
        )
        // Estática antes da paramétrica: /inventory/stock-entry/ não é um {id}
        .route(
            "/inventory/stock-entry/",
            post(handlers::inventory::stock_entry),
        )
        .route("/inventory/{id}/", get(handlers::inventory::get_inventory))
        .route(
            "/inventory/{id}/transactions/",
            get(handlers::inventory::list_inventory_transactions),
        )
        .route(
            "/inventory/{id}/adjust/",
            post(handlers::inventory::adjust_stock),
        );

    let service_request_routes = Router::new()
        .route(
            "/service_request/",
            get(handlers::service_requests::list_service_requests)
                .post(handlers::service_requests::create_service_request),
        )
        .route(
            "/service_request/{id}/",
            get(handlers::service_requests::get_service_request)
                .patch(handlers::service_requests::update_service_request)
                .delete(handlers::service_requests::delete_service_request),
        )
        .route(
            "/service_request/{id}/complete/",
            post(handlers::service_requests::complete_service_request),
        )
        .route(
            "/product-usage/",
            post(handlers::service_requests::add_product_usage),
        )
        .route(
            "/product-usage/{service_request_id}/",
            get(handlers::service_requests::list_product_usages),
        )
        .route(
            "/service-types/",
            get(handlers::service_requests::list_service_types)
                .post(handlers::service_requests::create_service_type),
        );

    let billing_routes = Router::new()
        .route("/invoices/", get(handlers::invoices::list_invoices))
        .route(
            "/invoices/{id}/",
            get(handlers::invoices::get_invoice).patch(handlers::invoices::update_invoice),
        )
        .route(
            "/promotions/",
            get(handlers::promotions::list_promotions)
                .post(handlers::promotions::create_promotion),
        )
        .route("/promotions/{id}/", get(handlers::promotions::get_promotion));

    let appointment_routes = Router::new()
        .route(
            "/appointments/",
            get(handlers::appointments::list_appointments)
                .post(handlers::appointments::create_appointment),
        )
        .route(
            "/appointments/{id}/",
            get(handlers::appointments::get_appointment)
                .patch(handlers::appointments::update_appointment_status),
        )
        .route(
            "/appointments/{id}/convert/",
            post(handlers::appointments::convert_appointment),
        );

    // Tudo que é recurso de negócio exige autenticação.
    let protected_routes = Router::new()
        .merge(site_routes)
        .merge(crm_routes)
        .merge(inventory_routes)
        .merge(service_request_routes)
        .merge(billing_routes)
        .merge(appointment_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    let api = Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .merge(protected_routes);

    Router::new()
        .nest("/api", api)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .with_state(app_state)
}
