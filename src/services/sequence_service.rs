// src/services/sequence_service.rs

use chrono::{Datelike, Utc};
use sqlx::{Executor, Postgres};

use crate::{common::error::AppError, db::SequenceRepository};

// Larguras do zero-padding por tipo de entidade:
// OS/venda/agendamento usam 4 dígitos, fatura usa 5.
pub const SHORT_WIDTH: usize = 4;
pub const INVOICE_WIDTH: usize = 5;

// Prefixos dos números legíveis.
pub const PREFIX_SERVICE: &str = "SR";
pub const PREFIX_SALE: &str = "SALE";
pub const PREFIX_APPOINTMENT: &str = "APT";
pub const PREFIX_INVOICE: &str = "INV";

#[derive(Clone)]
pub struct SequenceService {
    repo: SequenceRepository,
}

impl SequenceService {
    pub fn new(repo: SequenceRepository) -> Self {
        Self { repo }
    }

    /// Gera o próximo número legível para o prefixo, no ano corrente.
    ///
    /// Deve rodar dentro da transação que cria o registro: se ela abortar, o
    /// valor alocado volta e a sequência continua sem buracos.
    pub async fn next_display_number<'e, E>(
        &self,
        executor: E,
        prefix: &str,
        width: usize,
    ) -> Result<String, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let year = Utc::now().year();
        let value = self.repo.allocate(executor, prefix, year).await?;
        Ok(format_display_number(prefix, year, value, width))
    }
}

/// Formata `{prefixo}-{ano}-{valor com zero-padding}`, ex: INV-2025-00001.
/// Valores acima da largura não são truncados (o 10000º SR vira SR-2025-10000).
pub fn format_display_number(prefix: &str, year: i32, value: i64, width: usize) -> String {
    format!("{}-{}-{:0width$}", prefix, year, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formata_com_largura_quatro_e_cinco() {
        assert_eq!(format_display_number("SR", 2025, 42, SHORT_WIDTH), "SR-2025-0042");
        assert_eq!(
            format_display_number("SALE", 2025, 7, SHORT_WIDTH),
            "SALE-2025-0007"
        );
        assert_eq!(
            format_display_number("INV", 2025, 1, INVOICE_WIDTH),
            "INV-2025-00001"
        );
    }

    #[test]
    fn nao_trunca_acima_da_largura() {
        assert_eq!(
            format_display_number("SR", 2025, 12345, SHORT_WIDTH),
            "SR-2025-12345"
        );
    }

    #[test]
    fn formato_persiste_o_padrao_legivel() {
        // O formato precisa bater com ^[A-Z]+-\d{4}-\d{4,5}$ para os números
        // usuais (o frontend e os recibos dependem disso).
        for (prefix, width) in [
            (PREFIX_SERVICE, SHORT_WIDTH),
            (PREFIX_SALE, SHORT_WIDTH),
            (PREFIX_APPOINTMENT, SHORT_WIDTH),
            (PREFIX_INVOICE, INVOICE_WIDTH),
        ] {
            let number = format_display_number(prefix, 2025, 42, width);
            let mut parts = number.split('-');
            assert_eq!(parts.next(), Some(prefix));
            assert_eq!(parts.next(), Some("2025"));
            let value = parts.next().unwrap();
            assert_eq!(value.len(), width);
            assert!(value.chars().all(|c| c.is_ascii_digit()));
            assert_eq!(parts.next(), None);
        }
    }
}
