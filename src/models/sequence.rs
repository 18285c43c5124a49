// src/models/sequence.rs

use serde::Serialize;
use sqlx::FromRow;

// Contador por (prefixo, ano) para números legíveis (INV-2025-00001 etc).
// Linha criada sob demanda na primeira alocação; a única mutação permitida
// é o incremento de last_value, sempre sob lock de linha.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DisplayNumberSequence {
    pub prefix: String,
    pub year: i32,
    pub last_value: i64,
}
