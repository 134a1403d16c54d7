pub mod blobstore;
pub mod flutterwave;
pub mod ledger;

pub use blobstore::BlobStore;
pub use flutterwave::FlutterwaveClient;
pub use ledger::PurchaseLedger;
