use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod parsed;

use parsed::ParsedResource;

/// Implements `scopekv::resources::Resource` for a struct with named fields.
///
/// ```text
/// #[derive(ConfigResource, Serialize, Deserialize)]
/// #[resource(kind = "checks", scope = "environment", validate = "validate_check")]
/// pub struct CheckConfig {
///     #[resource(name)]
///     pub name: String,
///     #[resource(organization)]
///     pub organization: String,
///     #[resource(environment)]
///     pub environment: String,
///     pub command: String,
/// }
/// ```
#[proc_macro_derive(ConfigResource, attributes(resource))]
pub fn derive_config_resource(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match ParsedResource::from_input(&input) {
        Ok(parsed) => parsed.emit().into(),
        Err(err) => err.to_compile_error().into(),
    }
}
