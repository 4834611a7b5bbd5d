//! Application services and ports for the access audit pipeline.

#![forbid(unsafe_code)]

mod collection_ports;
mod collector_service;
mod delivery_ports;
mod report_service;
mod snapshot_ports;

pub use collection_ports::{
    AccountAssignment, AttachedManagedPolicy, AuthorityClient, DirectoryUser,
    IdentityDirectoryClient, PermissionSetDescription, PolicyResolver,
};
pub use collector_service::{CollectionSummary, CollectorService};
pub use delivery_ports::{ArtifactRef, ArtifactSink, NotificationPublisher};
pub use report_service::ReportService;
pub use snapshot_ports::SnapshotStore;
