// ABOUTME: Declarative extraction building blocks: schemas, selectors, and field strategies.
// ABOUTME: Includes the date/time normalizer, image and link resolvers, and the schema loader.

//! Extraction module.
//!
//! Submodules:
//! - `schema`: Site schema data model and the schema set.
//! - `registry`: Field kinds, parse methods, and schema validation.
//! - `loader`: Schema sets from JSON text, files, or the builtin set.
//! - `compiled`: Locator lowering to CSS and the selector cache.
//! - `select`: Locator resolution against document nodes.
//! - `fields`: Per-field extraction strategies.
//! - `datetime`: Date/time normalization strategies.
//! - `image`: Image URL resolution.
//! - `links`: Relative link resolution.

pub mod compiled;
pub mod datetime;
pub mod fields;
pub mod image;
pub mod links;
pub mod loader;
pub mod registry;
pub mod schema;
pub mod select;
