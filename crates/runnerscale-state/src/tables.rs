//! redb table definitions for the inventory store.

use redb::TableDefinition;

/// Runner records keyed by `{environment}:{scope_key}:{instance_id}`.
pub const RUNNERS: TableDefinition<&str, &[u8]> = TableDefinition::new("runners");
