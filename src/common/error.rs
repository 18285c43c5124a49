// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Nosso tipo de erro de domínio, com `thiserror` para melhor ergonomia.
// As mensagens do `#[error(...)]` são para logs; a resposta HTTP é montada
// em `to_api_error`, já traduzida pelo I18nStore.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("SKU já existe")]
    SkuAlreadyExists,

    #[error("Já existe registro de estoque para este produto nesta filial")]
    InventoryAlreadyExists,

    #[error("Filial não encontrada")]
    SiteNotFound,

    #[error("Cliente não encontrado")]
    CustomerNotFound,

    #[error("Veículo não encontrado")]
    VehicleNotFound,

    #[error("Mecânico não encontrado")]
    MechanicNotFound,

    #[error("Produto não encontrado")]
    ProductNotFound,

    #[error("Registro de estoque não encontrado")]
    InventoryNotFound,

    #[error("Ordem de serviço não encontrada")]
    ServiceRequestNotFound,

    #[error("Tipo de serviço não encontrado")]
    ServiceTypeNotFound,

    #[error("Fatura não encontrada")]
    InvoiceNotFound,

    #[error("Promoção não encontrada")]
    PromotionNotFound,

    #[error("Agendamento não encontrado")]
    AppointmentNotFound,

    // --- Regras de negócio do fluxo de conclusão ---

    // Sinal de idempotência: a OS já está fechada, nada foi alterado.
    #[error("Ordem de serviço já concluída")]
    AlreadyCompleted,

    // Registro concluído é imutável (sem edição, exclusão ou novos itens).
    #[error("Registro concluído não pode ser alterado")]
    CompletedImmutable,

    #[error("Sem registro de estoque para '{product}' na filial '{site}'")]
    NoStockRecord { product: String, site: String },

    #[error("Estoque insuficiente para '{product}': disponível {have}, necessário {need}")]
    InsufficientStock {
        product: String,
        have: i32,
        need: i32,
    },

    // Venda balcão (sem veículo) não carrega campos de serviço.
    #[error("Campo '{0}' não é permitido em venda sem veículo")]
    SaleFieldNotAllowed(&'static str),

    #[error("Ordem de serviço exige um veículo associado")]
    ServiceRequiresVehicle,

    #[error("Promoção não pode ter percentual e valor fixo ao mesmo tempo")]
    PromotionConflict,

    // Concluir é só pelo endpoint de conclusão, nunca por PATCH de status.
    #[error("Conclusão manual de status não é permitida")]
    ManualCompletionForbidden,

    #[error("Agendamento em estado terminal não pode ser alterado")]
    AppointmentTerminal,

    #[error("Agendamento já convertido em ordem de serviço")]
    AppointmentAlreadyConverted,

    // --- Escopo de filial ---

    // Usuário de matriz (somente leitura) ou escrita fora da própria filial.
    #[error("Usuário sem permissão de escrita nesta filial")]
    SiteWriteForbidden,

    // Trocar a filial de um registro existente: só superuser.
    #[error("Reatribuição de filial requer superuser")]
    CrossSiteForbidden,

    // --- Infraestrutura ---

    // Falha ao alocar número sequencial: a transação inteira aborta, então o
    // chamador pode repetir a operação com segurança.
    #[error("Falha ao alocar número sequencial")]
    SequenceAllocation(#[source] sqlx::Error),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// O erro "pronto para HTTP": status + mensagem já traduzida.
// É ele que implementa IntoResponse e serve de Rejection nos extratores.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => Json(json!({ "error": self.message, "details": details })),
            None => Json(json!({ "error": self.message })),
        };
        (self.status, body).into_response()
    }
}

impl AppError {
    /// Converte o erro de domínio em resposta HTTP, traduzindo a mensagem
    /// para o idioma negociado no Accept-Language.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let lang = locale.0.as_str();

        // Validação é o único caso com corpo estruturado (campo -> mensagens).
        if let AppError::ValidationError(errors) = self {
            let mut details = serde_json::Map::new();
            for (field, field_errors) in errors.field_errors() {
                let messages: Vec<serde_json::Value> = field_errors
                    .iter()
                    .filter_map(|e| e.message.as_ref().map(|m| json!(m.to_string())))
                    .collect();
                details.insert(field.to_string(), json!(messages));
            }
            return ApiError {
                status: StatusCode::BAD_REQUEST,
                message: store.t(lang, "validation"),
                details: Some(serde_json::Value::Object(details)),
            };
        }

        let (status, key) = match self {
            AppError::ValidationError(_) => unreachable!(),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token"),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "user_not_found"),
            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "email_exists"),
            AppError::SkuAlreadyExists => (StatusCode::CONFLICT, "sku_exists"),
            AppError::InventoryAlreadyExists => (StatusCode::CONFLICT, "inventory_exists"),
            AppError::SiteNotFound => (StatusCode::NOT_FOUND, "site_not_found"),
            AppError::CustomerNotFound => (StatusCode::NOT_FOUND, "customer_not_found"),
            AppError::VehicleNotFound => (StatusCode::NOT_FOUND, "vehicle_not_found"),
            AppError::MechanicNotFound => (StatusCode::NOT_FOUND, "mechanic_not_found"),
            AppError::ProductNotFound => (StatusCode::NOT_FOUND, "product_not_found"),
            AppError::InventoryNotFound => (StatusCode::NOT_FOUND, "inventory_not_found"),
            AppError::ServiceRequestNotFound => {
                (StatusCode::NOT_FOUND, "service_request_not_found")
            }
            AppError::ServiceTypeNotFound => (StatusCode::NOT_FOUND, "service_type_not_found"),
            AppError::InvoiceNotFound => (StatusCode::NOT_FOUND, "invoice_not_found"),
            AppError::PromotionNotFound => (StatusCode::NOT_FOUND, "promotion_not_found"),
            AppError::AppointmentNotFound => (StatusCode::NOT_FOUND, "appointment_not_found"),
            AppError::AlreadyCompleted => (StatusCode::BAD_REQUEST, "already_completed"),
            AppError::CompletedImmutable => (StatusCode::BAD_REQUEST, "completed_immutable"),
            AppError::ServiceRequiresVehicle => {
                (StatusCode::BAD_REQUEST, "service_requires_vehicle")
            }
            AppError::PromotionConflict => (StatusCode::BAD_REQUEST, "promotion_conflict"),
            AppError::ManualCompletionForbidden => {
                (StatusCode::BAD_REQUEST, "manual_completion_forbidden")
            }
            AppError::AppointmentTerminal => (StatusCode::BAD_REQUEST, "appointment_terminal"),
            AppError::AppointmentAlreadyConverted => {
                (StatusCode::BAD_REQUEST, "appointment_already_converted")
            }
            AppError::SiteWriteForbidden => (StatusCode::FORBIDDEN, "site_write_forbidden"),
            AppError::CrossSiteForbidden => (StatusCode::FORBIDDEN, "cross_site_forbidden"),

            AppError::NoStockRecord { product, site } => {
                let message = store
                    .t(lang, "no_stock_record")
                    .replace("{product}", product)
                    .replace("{site}", site);
                return ApiError::new(StatusCode::BAD_REQUEST, message);
            }
            AppError::InsufficientStock {
                product,
                have,
                need,
            } => {
                let message = store
                    .t(lang, "insufficient_stock")
                    .replace("{product}", product)
                    .replace("{have}", &have.to_string())
                    .replace("{need}", &need.to_string());
                return ApiError::new(StatusCode::BAD_REQUEST, message);
            }
            AppError::SaleFieldNotAllowed(field) => {
                let message = store
                    .t(lang, "sale_field_not_allowed")
                    .replace("{field}", field);
                return ApiError::new(StatusCode::BAD_REQUEST, message);
            }

            // Erros de infraestrutura: loga o detalhe e responde genérico.
            AppError::SequenceAllocation(e) => {
                tracing::error!("Falha na alocação de sequência: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        };

        ApiError::new(status, store.t(lang, key))
    }
}
