// src/db/sequence_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{common::error::AppError, models::sequence::DisplayNumberSequence};

// Repositório do contador de numeração legível por (prefixo, ano).
#[derive(Clone)]
pub struct SequenceRepository {
    pool: PgPool,
}

impl SequenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Aloca o próximo valor para (prefixo, ano).
    ///
    /// É um UPSERT em uma única query: tenta INSERIR com last_value = 1; se a
    /// linha já existir (ON CONFLICT), incrementa. O Postgres segura o lock da
    /// linha até o fim da transação do chamador, então duas conclusões
    /// concorrentes nunca enxergam o mesmo valor, e um rollback devolve o
    /// número, mantendo a sequência sem buracos.
    ///
    /// Qualquer falha vira SequenceAllocation: a transação inteira do chamador
    /// deve abortar (nenhum registro pode existir sem o seu número).
    pub async fn allocate<'e, E>(
        &self,
        executor: E,
        prefix: &str,
        year: i32,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let value: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO display_number_sequences (prefix, year, last_value)
            VALUES ($1, $2, 1)
            ON CONFLICT (prefix, year)
            DO UPDATE SET last_value = display_number_sequences.last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(prefix)
        .bind(year)
        .fetch_one(executor)
        .await
        .map_err(AppError::SequenceAllocation)?;

        Ok(value)
    }

    /// Estado atual do contador de (prefixo, ano), se a linha já existir.
    /// Leitura simples, fora de transação: usa a pool principal.
    #[allow(dead_code)]
    pub async fn find(
        &self,
        prefix: &str,
        year: i32,
    ) -> Result<Option<DisplayNumberSequence>, AppError> {
        let sequence = sqlx::query_as::<_, DisplayNumberSequence>(
            "SELECT * FROM display_number_sequences WHERE prefix = $1 AND year = $2",
        )
        .bind(prefix)
        .bind(year)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Cada #[sqlx::test] roda em um banco recém-migrado.

    #[sqlx::test]
    async fn aloca_valores_consecutivos_a_partir_de_um(pool: PgPool) {
        let repo = SequenceRepository::new(pool.clone());

        for expected in 1..=5i64 {
            let mut tx = pool.begin().await.unwrap();
            let value = repo.allocate(&mut *tx, "INV", 2025).await.unwrap();
            tx.commit().await.unwrap();
            assert_eq!(value, expected);
        }

        let sequence = repo.find("INV", 2025).await.unwrap().unwrap();
        assert_eq!(sequence.last_value, 5);
        assert_eq!(sequence.prefix, "INV");
    }

    #[sqlx::test]
    async fn prefixos_e_anos_nao_se_misturam(pool: PgPool) {
        let repo = SequenceRepository::new(pool.clone());

        let mut tx = pool.begin().await.unwrap();
        assert_eq!(repo.allocate(&mut *tx, "INV", 2025).await.unwrap(), 1);
        assert_eq!(repo.allocate(&mut *tx, "SR", 2025).await.unwrap(), 1);
        assert_eq!(repo.allocate(&mut *tx, "INV", 2026).await.unwrap(), 1);
        assert_eq!(repo.allocate(&mut *tx, "INV", 2025).await.unwrap(), 2);
        tx.commit().await.unwrap();
    }

    #[sqlx::test]
    async fn rollback_devolve_o_numero_sem_deixar_buraco(pool: PgPool) {
        let repo = SequenceRepository::new(pool.clone());

        let mut tx = pool.begin().await.unwrap();
        assert_eq!(repo.allocate(&mut *tx, "INV", 2025).await.unwrap(), 1);
        tx.rollback().await.unwrap();

        // A alocação abortada volta: a próxima recebe 1 de novo.
        let mut tx = pool.begin().await.unwrap();
        assert_eq!(repo.allocate(&mut *tx, "INV", 2025).await.unwrap(), 1);
        tx.commit().await.unwrap();
    }

    #[sqlx::test]
    async fn alocacoes_concorrentes_sao_unicas_e_sem_lacunas(pool: PgPool) {
        // N tarefas alocando ao mesmo tempo: o conjunto final tem que ser
        // exatamente {1..N}, sem duplicata e sem buraco.
        const N: usize = 8;

        let mut handles = Vec::new();
        for _ in 0..N {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                let repo = SequenceRepository::new(pool.clone());
                let mut tx = pool.begin().await.unwrap();
                let value = repo.allocate(&mut *tx, "INV", 2025).await.unwrap();
                tx.commit().await.unwrap();
                value
            }));
        }

        let mut values = Vec::new();
        for handle in handles {
            values.push(handle.await.unwrap());
        }
        values.sort_unstable();

        let expected: Vec<i64> = (1..=N as i64).collect();
        assert_eq!(values, expected);
    }
}
