//! Wire records mirrored from the external catalog.
//!
//! Field names follow the catalog's JSON exactly (Spanish, camelCase where
//! the catalog uses it); serde renames keep the Rust side idiomatic. All
//! three collections are keyed by a numeric identifier the catalog owns —
//! the mirror never invents ids.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A record that can be mirrored: has a stable remote-assigned id.
pub trait MirrorRecord: Clone + Send + Sync + 'static {
    /// The remote identifier this record is keyed by.
    fn id(&self) -> i64;
}

/// Event-kind pair carried by summaries and full events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventKind {
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
}

/// Condensed event row from `/api/endpoints/v1/eventos-resumidos`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummaryRecord {
    pub id: i64,
    pub titulo: Option<String>,
    pub resumen: Option<String>,
    pub descripcion: Option<String>,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub fecha: Option<OffsetDateTime>,
    #[serde(rename = "precioEntrada")]
    pub precio_entrada: Option<f64>,
    #[serde(rename = "eventoTipo")]
    pub evento_tipo: Option<EventKind>,
}

impl MirrorRecord for EventSummaryRecord {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Performer entry on a full event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performer {
    pub nombre: Option<String>,
    pub apellido: Option<String>,
    pub identificacion: Option<String>,
}

/// Full event row from `/api/endpoints/v1/eventos`, including venue layout
/// and performer list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: i64,
    pub titulo: Option<String>,
    pub resumen: Option<String>,
    pub descripcion: Option<String>,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub fecha: Option<OffsetDateTime>,
    pub direccion: Option<String>,
    pub imagen: Option<String>,
    #[serde(rename = "filaAsientos")]
    pub fila_asientos: Option<u32>,
    #[serde(rename = "columnAsientos")]
    pub column_asientos: Option<u32>,
    #[serde(rename = "precioEntrada")]
    pub precio_entrada: Option<f64>,
    #[serde(rename = "eventoTipo")]
    pub evento_tipo: Option<EventKind>,
    #[serde(default)]
    pub integrantes: Vec<Performer>,
}

impl MirrorRecord for EventRecord {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Sale row from `/api/endpoints/v1/listar-ventas`, keyed by `ventaId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    #[serde(rename = "ventaId")]
    pub venta_id: i64,
    #[serde(rename = "eventoId")]
    pub evento_id: i64,
    #[serde(rename = "fechaVenta", with = "time::serde::rfc3339::option", default)]
    pub fecha_venta: Option<OffsetDateTime>,
    pub resultado: bool,
    pub descripcion: Option<String>,
    #[serde(rename = "precioVenta")]
    pub precio_venta: Option<f64>,
    #[serde(rename = "cantidadAsientos")]
    pub cantidad_asientos: Option<u32>,
}

impl MirrorRecord for SaleRecord {
    fn id(&self) -> i64 {
        self.venta_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_decodes_catalog_json() {
        let json = r#"{
            "id": 7,
            "titulo": "Concierto",
            "resumen": "Una noche",
            "descripcion": "Larga descripcion",
            "fecha": "2026-09-01T20:00:00Z",
            "precioEntrada": 1500.0,
            "eventoTipo": {"nombre": "Recital", "descripcion": "Musica en vivo"}
        }"#;

        let record: EventSummaryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id(), 7);
        assert_eq!(record.evento_tipo.as_ref().unwrap().nombre.as_deref(), Some("Recital"));
        assert_eq!(record.fecha.unwrap().year(), 2026);
    }

    #[test]
    fn full_event_tolerates_missing_optional_fields() {
        let json = r#"{"id": 3}"#;
        let record: EventRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id(), 3);
        assert!(record.integrantes.is_empty());
        assert!(record.fecha.is_none());
    }

    #[test]
    fn sale_is_keyed_by_venta_id() {
        let json = r#"{
            "ventaId": 42,
            "eventoId": 7,
            "fechaVenta": "2026-08-20T12:30:00Z",
            "resultado": true,
            "descripcion": "ok",
            "precioVenta": 3000.0,
            "cantidadAsientos": 2
        }"#;

        let record: SaleRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id(), 42);
        assert_eq!(record.evento_id, 7);
        assert!(record.resultado);
    }
}
