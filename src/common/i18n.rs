// src/common/i18n.rs

use std::collections::HashMap;

// Catálogo de mensagens da API: inglês como padrão, português como tradução.
// Mensagens parametrizadas usam placeholders {assim}, substituídos no
// to_api_error (ver common/error.rs).
struct Entry {
    en: &'static str,
    pt: &'static str,
}

pub struct I18nStore {
    messages: HashMap<&'static str, Entry>,
}

impl I18nStore {
    pub fn new() -> Self {
        let mut messages = HashMap::new();

        let mut add = |key: &'static str, en: &'static str, pt: &'static str| {
            messages.insert(key, Entry { en, pt });
        };

        add(
            "validation",
            "One or more fields are invalid.",
            "Um ou mais campos são inválidos.",
        );
        add(
            "invalid_credentials",
            "Invalid e-mail or password.",
            "E-mail ou senha inválidos.",
        );
        add(
            "invalid_token",
            "Missing or invalid authentication token.",
            "Token de autenticação inválido ou ausente.",
        );
        add("user_not_found", "User not found.", "Usuário não encontrado.");
        add(
            "email_exists",
            "This e-mail is already in use.",
            "Este e-mail já está em uso.",
        );
        add(
            "sku_exists",
            "This SKU is already in use.",
            "Este SKU já está em uso.",
        );
        add(
            "inventory_exists",
            "This product already has an inventory record at this site.",
            "Este produto já tem registro de estoque nesta filial.",
        );
        add("site_not_found", "Site not found.", "Filial não encontrada.");
        add(
            "customer_not_found",
            "Customer not found.",
            "Cliente não encontrado.",
        );
        add(
            "vehicle_not_found",
            "Vehicle not found.",
            "Veículo não encontrado.",
        );
        add(
            "mechanic_not_found",
            "Mechanic not found.",
            "Mecânico não encontrado.",
        );
        add(
            "product_not_found",
            "Product not found.",
            "Produto não encontrado.",
        );
        add(
            "inventory_not_found",
            "Inventory record not found.",
            "Registro de estoque não encontrado.",
        );
        add(
            "service_request_not_found",
            "Service request not found.",
            "Ordem de serviço não encontrada.",
        );
        add(
            "service_type_not_found",
            "Service type not found.",
            "Tipo de serviço não encontrado.",
        );
        add(
            "invoice_not_found",
            "Invoice not found.",
            "Fatura não encontrada.",
        );
        add(
            "promotion_not_found",
            "Promotion not found.",
            "Promoção não encontrada.",
        );
        add(
            "appointment_not_found",
            "Appointment not found.",
            "Agendamento não encontrado.",
        );
        add(
            "already_completed",
            "Already completed.",
            "Já concluída.",
        );
        add(
            "completed_immutable",
            "Completed records cannot be modified.",
            "Registros concluídos não podem ser alterados.",
        );
        add(
            "no_stock_record",
            "No inventory record for '{product}' at site '{site}'.",
            "Sem registro de estoque para '{product}' na filial '{site}'.",
        );
        add(
            "insufficient_stock",
            "Insufficient inventory for '{product}': have {have}, need {need}.",
            "Estoque insuficiente para '{product}': disponível {have}, necessário {need}.",
        );
        add(
            "sale_field_not_allowed",
            "Walk-in sales cannot carry '{field}'.",
            "Vendas sem veículo não podem ter '{field}'.",
        );
        add(
            "service_requires_vehicle",
            "Service requests must have an associated vehicle.",
            "Ordens de serviço exigem um veículo associado.",
        );
        add(
            "promotion_conflict",
            "Use either a percentage or a fixed amount, not both.",
            "Use percentual OU valor fixo, nunca os dois.",
        );
        add(
            "manual_completion_forbidden",
            "Use the completion endpoint to complete a record.",
            "Use o endpoint de conclusão para concluir o registro.",
        );
        add(
            "appointment_already_converted",
            "Appointment was already converted into a service request.",
            "Agendamento já foi convertido em ordem de serviço.",
        );
        add(
            "appointment_terminal",
            "Appointment is in a terminal state and cannot be changed.",
            "Agendamento em estado terminal não pode ser alterado.",
        );
        add(
            "site_write_forbidden",
            "You cannot write data for this site.",
            "Você não tem permissão de escrita nesta filial.",
        );
        add(
            "cross_site_forbidden",
            "Only a superuser can move a record to another site.",
            "Apenas superuser pode mover um registro de filial.",
        );
        add(
            "internal",
            "An unexpected error occurred.",
            "Ocorreu um erro inesperado.",
        );

        Self { messages }
    }

    /// Busca a mensagem no idioma pedido; cai para o inglês se a chave (ou o
    /// idioma) não existir.
    pub fn t(&self, lang: &str, key: &str) -> String {
        match self.messages.get(key) {
            Some(entry) if lang == "pt" => entry.pt.to_string(),
            Some(entry) => entry.en.to_string(),
            None => key.to_string(),
        }
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cai_para_ingles_quando_idioma_desconhecido() {
        let store = I18nStore::new();
        assert_eq!(store.t("fr", "already_completed"), "Already completed.");
        assert_eq!(store.t("pt", "already_completed"), "Já concluída.");
    }

    #[test]
    fn chave_desconhecida_retorna_a_propria_chave() {
        let store = I18nStore::new();
        assert_eq!(store.t("en", "nope"), "nope");
    }
}
