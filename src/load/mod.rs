//! The load engine: CSV records in, remapped upserts out, id-map updated.

pub mod diff;
pub mod driver;
pub mod idmap;
pub mod record;
pub mod schema;
pub mod script;
pub mod sfid;
pub mod transform;

pub use diff::{DiffStatus, FieldChange};
pub use driver::{
    BatchDriver, BatchOutcome, DEFAULT_BATCH_SIZE, DiffSummary, LoadMode, LoadOptions, LoadReport,
    validate_external_ids,
};
pub use idmap::{IdMap, IdMapFile};
pub use record::{Record, read_records, read_records_from};
pub use schema::{FieldClassification, FieldKind};
pub use sfid::{is_valid_id, to_18};
pub use transform::{FieldTransformer, FieldValue, TransformedBatch, TransformedRecord, bulk_csv};
