//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `taskforge-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `Filesystem`: File operations
//!   - `TemplateRenderer`: Template rendering
//!   - `TypekitSource`, `DescriptorParser`, `PackageResolver`: typekit discovery
//!   - `TaskLibrarySource`: imported task library discovery
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (Defined in CLI layer, implemented by services)

pub mod output;

pub use output::{
    DescriptorParser, Filesystem, PackageResolver, RawTypekit, TaskLibrarySource,
    TemplateRenderer, TypekitSource,
};

#[cfg(test)]
pub use output::{
    MockDescriptorParser, MockFilesystem, MockPackageResolver, MockTaskLibrarySource,
    MockTemplateRenderer, MockTypekitSource,
};
