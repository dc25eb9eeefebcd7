use darling::{ast, FromMeta};
use proc_macro::TokenStream;
use quote::{format_ident, quote};

#[derive(FromMeta)]
struct RouteArgs {
	#[darling(multiple)]
	tag: Vec<syn::Expr>,
	#[darling(multiple)]
	response: Vec<ResponseArgs>,
}

#[derive(FromMeta)]
struct ResponseArgs {
	status: syn::LitInt,
	shape: Option<syn::Type>,
	description: Option<String>,
}

pub fn expand(args: TokenStream, input: TokenStream) -> TokenStream {
	let args = match ast::NestedMeta::parse_meta_list(args.into()) {
		Ok(args) => args,
		Err(e) => return e.into_compile_error().into(),
	};

	let args = match RouteArgs::from_list(&args) {
		Ok(args) => args,
		Err(e) => return e.write_errors().into(),
	};

	let function = syn::parse_macro_input!(input as syn::ItemFn);
	let (summary, description) = doc_paragraphs(&function.attrs);

	let docs_ident = format_ident!("{}_docs", function.sig.ident);
	let vis = &function.vis;
	let tags = &args.tag;

	let responses = args.response.into_iter().map(|response| {
		let ResponseArgs {
			status,
			shape,
			description,
		} = response;
		let shape = shape.map_or_else(|| quote!(()), |shape| quote!(#shape));

		match description {
			Some(description) => quote! {
				.response_with::<#status, #shape, _>(|res| res.description(#description))
			},
			None => quote! {
				.response::<#status, #shape>()
			},
		}
	});

	quote! {
		#function

		#vis fn #docs_ident(op: aide::transform::TransformOperation) -> aide::transform::TransformOperation {
			op.summary(#summary).description(#description)
				#(.tag(#tags))*
				#(#responses)*
		}
	}
	.into()
}

/// Splits a doc comment into (summary, description): the first paragraph is
/// the summary, the remainder the description. A single-paragraph comment is
/// reused for both.
fn doc_paragraphs(attrs: &[syn::Attribute]) -> (String, String) {
	let mut lines = String::new();

	for attr in attrs {
		let syn::Meta::NameValue(pair) = &attr.meta else {
			continue;
		};

		if !pair.path.is_ident("doc") {
			continue;
		}

		let syn::Expr::Lit(syn::ExprLit {
			lit: syn::Lit::Str(text),
			..
		}) = &pair.value
		else {
			continue;
		};

		lines.push_str(text.value().trim());
		lines.push('\n');
	}

	let lines = lines.trim().replace("\\\n", "");
	let mut paragraphs = lines.splitn(2, '\n').filter(|p| !p.is_empty());

	let summary = paragraphs
		.next()
		.unwrap_or("Undocumented route")
		.replace('\n', " ");
	let description = paragraphs.next().map_or_else(|| summary.clone(), str::to_owned);

	(summary, description)
}
