mod model;
mod route;

use proc_macro::TokenStream;

/// Generates a documentation transform for the route, named after the original
/// function with the suffix `_docs`.
///
/// The first paragraph of the doc comment becomes the operation summary and
/// the remainder the description; `tag` and `response` arguments are forwarded
/// to the transform.
#[proc_macro_attribute]
pub fn route(args: TokenStream, input: TokenStream) -> TokenStream {
	route::expand(args, input)
}

/// Generates input structs for the model: `CreateX` with every
/// client-suppliable field verbatim, and `UpdateX` with each of those fields
/// wrapped in `Option`.
///
/// Fields marked `#[serde(skip)]` or `#[serde(skip_deserializing)]`, which the
/// client can never supply, are left out. Pass `#[model(create)]` or
/// `#[model(update)]` to generate only one of the two.
#[proc_macro_attribute]
pub fn model(args: TokenStream, input: TokenStream) -> TokenStream {
	model::expand(args, input)
}
