//! Inventory payloads and in-memory vault setups

use glacier_sweep::glacier::InMemoryGlacier;
use std::sync::Arc;

/// Account id used by every in-memory fixture
pub const ACCOUNT: &str = "012345678901";

/// Region used by every in-memory fixture
pub const REGION: &str = "us-east-1";

/// Inventory output listing three archives of vault `v`
pub const THREE_ARCHIVE_INVENTORY: &str = r#"{
    "VaultARN": "arn:aws:glacier:us-east-1:012345678901:vaults/v",
    "InventoryDate": "2024-05-01T12:00:00Z",
    "ArchiveList": [
        {"ArchiveId": "A1", "ArchiveDescription": "photos 2019", "CreationDate": "2023-01-01T00:00:00Z", "Size": 1024, "SHA256TreeHash": "aa11"},
        {"ArchiveId": "A2", "ArchiveDescription": "", "CreationDate": "2023-01-02T00:00:00Z", "Size": 9007199254740993, "SHA256TreeHash": "bb22"},
        {"ArchiveId": "A3", "ArchiveDescription": "db dump", "CreationDate": "2023-01-03T00:00:00Z", "Size": 0, "SHA256TreeHash": "cc33"}
    ]
}"#;

/// Inventory output for an empty vault `v`
pub const EMPTY_INVENTORY: &str = r#"{
    "VaultARN": "arn:aws:glacier:us-east-1:012345678901:vaults/v",
    "InventoryDate": "2024-05-01T12:00:00Z",
    "ArchiveList": []
}"#;

/// Inventory output missing its archive list
pub const INVENTORY_WITHOUT_ARCHIVE_LIST: &str = r#"{
    "VaultARN": "arn:aws:glacier:us-east-1:012345678901:vaults/v",
    "InventoryDate": "2024-05-01T12:00:00Z"
}"#;

/// An in-memory service with one vault `name` holding `archives`
pub fn vault_with_archives(name: &str, archives: &[&str]) -> Arc<InMemoryGlacier> {
    let glacier = Arc::new(InMemoryGlacier::new(ACCOUNT, REGION));
    glacier.create_vault(name);
    for (i, id) in archives.iter().enumerate() {
        glacier.add_archive(name, id, (i as i64 + 1) * 1024);
    }
    glacier
}
