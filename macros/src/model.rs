use darling::{ast, FromDeriveInput, FromField, FromMeta};
use proc_macro2::TokenTree;
use quote::{format_ident, quote, ToTokens};
use syn::Meta;

#[derive(Debug, FromMeta)]
struct ModelArgs {
	#[darling(default)]
	create: bool,
	#[darling(default)]
	update: bool,
}

#[derive(Debug, FromDeriveInput)]
#[darling(supports(struct_named), forward_attrs)]
struct ModelReceiver {
	ident: syn::Ident,

	generics: syn::Generics,

	data: ast::Data<(), ModelField>,

	attrs: Vec<syn::Attribute>,
}

#[derive(Debug, FromField)]
#[darling(forward_attrs)]
struct ModelField {
	ident: Option<syn::Ident>,

	ty: syn::Type,
	vis: syn::Visibility,

	attrs: Vec<syn::Attribute>,
}

pub fn expand(args: proc_macro::TokenStream, input: proc_macro::TokenStream) -> proc_macro::TokenStream {
	// Bare `#[model]` generates both structs.
	let args = if args.is_empty() {
		ModelArgs {
			create: true,
			update: true,
		}
	} else {
		let args = match ast::NestedMeta::parse_meta_list(args.into()) {
			Ok(args) => args,
			Err(e) => return e.into_compile_error().into(),
		};

		match ModelArgs::from_list(&args) {
			Ok(args) => args,
			Err(e) => return e.write_errors().into(),
		}
	};

	let input = syn::parse_macro_input!(input as syn::DeriveInput);
	let receiver = match ModelReceiver::from_derive_input(&input) {
		Ok(receiver) => receiver,
		Err(e) => return e.write_errors().into(),
	};

	let vis = &input.vis;
	let generics = &receiver.generics;
	let attrs = &receiver.attrs;

	let fields = receiver.data.take_struct().expect("expected a named struct");
	let fields = fields
		.iter()
		.filter(|field| field.ident.is_some() && !skipped(&field.attrs))
		.collect::<Vec<_>>();

	let mut output = quote!(#input);

	if args.create {
		let ident = format_ident!("Create{}", receiver.ident);
		let fields = fields.iter().map(|field| {
			let ModelField {
				ident, ty, vis, attrs,
			} = field;

			quote! {
				#(#attrs)*
				#vis #ident: #ty,
			}
		});

		output.extend(quote! {
			#(#attrs)*
			#vis struct #ident #generics {
				#(#fields)*
			}
		});
	}

	if args.update {
		let ident = format_ident!("Update{}", receiver.ident);
		let fields = fields.iter().map(|field| {
			let ModelField {
				ident, ty, vis, attrs,
			} = field;

			quote! {
				#(#attrs)*
				#vis #ident: Option<#ty>,
			}
		});

		output.extend(quote! {
			#(#attrs)*
			#vis struct #ident #generics {
				#(#fields)*
			}
		});
	}

	output.into()
}

/// Whether the client can never supply this field: `#[serde(skip)]` or
/// `#[serde(skip_deserializing)]`.
fn skipped(attrs: &[syn::Attribute]) -> bool {
	attrs.iter().any(|attr| {
		let Meta::List(list) = &attr.meta else {
			return false;
		};

		if !list.path.is_ident("serde") {
			return false;
		}

		list.tokens.to_token_stream().into_iter().any(|token| {
			matches!(token, TokenTree::Ident(ref ident) if ident == "skip_deserializing" || ident == "skip")
		})
	})
}
