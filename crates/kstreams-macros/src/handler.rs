//! `#[stream_handler]` attribute implementation.
//!
//! # Overview
//!
//! The attribute leaves the function itself untouched except for removing the
//! parameter attributes it understands, and emits a sibling module of the same
//! name holding the parameter descriptors:
//!
//! ```rust,ignore
//! #[stream_handler]
//! async fn on_event(record: ConsumerRecord, #[header(alias = "EventType")] kind: String) {}
//!
//! // expands to
//! async fn on_event(record: ConsumerRecord, kind: String) {}
//! mod on_event {
//!     pub fn parameters() -> Vec<::kstreams_framework::Param> {
//!         vec![
//!             ::kstreams_framework::Param::new("record"),
//!             ::kstreams_framework::Param::new("kind")
//!                 .marker(::kstreams_framework::Header::new().alias("EventType")),
//!         ]
//!     }
//! }
//! ```
//!
//! Functions and modules live in different namespaces, so both names resolve.
//!
//! # Attribute arguments
//!
//! | Key | Example | Description |
//! |-----|---------|-------------|
//! | `crate` | `"::kstreams::framework"` | Absolute path to the framework crate (default `::kstreams_framework`) |
//!
//! # Parameter attributes `#[header(...)]`
//!
//! | Key | Example | Description |
//! |-----|---------|-------------|
//! | *(none)* | `#[header]` | Default header marker |
//! | `alias` | `alias = "EventType"` | Look the header up under this key |
//! | `convert_underscores` | `convert_underscores = false` | Keep `_` in the derived key |

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{
    Attribute, FnArg, ItemFn, LitBool, LitStr, Pat, Path, meta::ParseNestedMeta, spanned::Spanned,
};

// ============================================================================
// Attribute structures
// ============================================================================

/// Arguments of `#[stream_handler(...)]`.
pub struct HandlerArgs {
    krate: Path,
}

impl Default for HandlerArgs {
    fn default() -> Self {
        Self {
            krate: syn::parse_quote!(::kstreams_framework),
        }
    }
}

impl HandlerArgs {
    pub fn parse(&mut self, meta: ParseNestedMeta<'_>) -> syn::Result<()> {
        if meta.path.is_ident("crate") {
            let lit = meta.value()?.parse::<LitStr>()?;
            let path: Path = lit.parse()?;
            if !is_absolute(&path) {
                return Err(syn::Error::new(
                    lit.span(),
                    "crate path must be absolute, start it with `::` or `crate::`",
                ));
            }
            self.krate = path;
            Ok(())
        } else {
            Err(meta.error("unsupported stream_handler argument, expected `crate`"))
        }
    }
}

/// A parsed `#[header(...)]` parameter attribute.
#[derive(Default)]
struct HeaderAttr {
    alias: Option<LitStr>,
    convert_underscores: Option<LitBool>,
}

/// One described parameter.
struct ParamSpec {
    name: String,
    span: Span,
    header: Option<HeaderAttr>,
}

/// The generated module sits one level below the handler, so only paths
/// that do not depend on the current module resolve there.
fn is_absolute(path: &Path) -> bool {
    path.leading_colon.is_some()
        || path.segments.first().is_some_and(|segment| segment.ident == "crate")
}

// ============================================================================
// Entry point
// ============================================================================

pub fn expand_stream_handler(args: HandlerArgs, mut item: ItemFn) -> syn::Result<TokenStream> {
    let mut params = Vec::with_capacity(item.sig.inputs.len());

    for input in item.sig.inputs.iter_mut() {
        let FnArg::Typed(typed) = input else {
            return Err(syn::Error::new(
                input.span(),
                "#[stream_handler] cannot be used on methods taking `self`",
            ));
        };

        let header = take_header_attr(&mut typed.attrs)?;
        let (name, span) = param_name(&typed.pat)?;
        params.push(ParamSpec { name, span, header });
    }

    let krate = &args.krate;
    let vis = &item.vis;
    let fn_name = &item.sig.ident;
    let doc = format!("Parameter descriptors of the `{fn_name}` handler.");
    let descriptors = params.iter().map(|param| param_tokens(krate, param));

    Ok(quote! {
        #item

        #[doc = #doc]
        #vis mod #fn_name {
            pub fn parameters() -> ::std::vec::Vec<#krate::Param> {
                ::std::vec![#(#descriptors),*]
            }
        }
    })
}

// ============================================================================
// Parameter parsing
// ============================================================================

/// Removes the `#[header]` attribute from a parameter and parses it.
fn take_header_attr(attrs: &mut Vec<Attribute>) -> syn::Result<Option<HeaderAttr>> {
    let Some(index) = attrs.iter().position(|a| a.path().is_ident("header")) else {
        return Ok(None);
    };
    let attr = attrs.remove(index);

    if attrs.iter().any(|a| a.path().is_ident("header")) {
        return Err(syn::Error::new(
            attr.span(),
            "a parameter takes at most one #[header] attribute",
        ));
    }

    let mut header = HeaderAttr::default();
    if matches!(attr.meta, syn::Meta::Path(_)) {
        return Ok(Some(header));
    }

    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("alias") {
            header.alias = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("convert_underscores") {
            header.convert_underscores = Some(meta.value()?.parse()?);
        } else {
            return Err(meta.error(
                "unsupported header argument, expected `alias` or `convert_underscores`",
            ));
        }
        Ok(())
    })?;

    Ok(Some(header))
}

/// Reads the parameter name from its pattern.
///
/// The identifier is used verbatim, leading underscores included. A
/// single-field tuple-struct pattern such as `FromHeader(event_type)` is
/// named after its inner binding.
fn param_name(pat: &Pat) -> syn::Result<(String, Span)> {
    match pat {
        Pat::Ident(ident) => Ok((ident.ident.to_string(), ident.ident.span())),
        Pat::TupleStruct(tuple) if tuple.elems.len() == 1 => param_name(&tuple.elems[0]),
        Pat::Wild(wild) => Err(syn::Error::new(
            wild.span(),
            "handler parameters need a name, `_` alone cannot be resolved",
        )),
        other => Err(syn::Error::new(
            other.span(),
            "#[stream_handler] parameters must be plain identifiers",
        )),
    }
}

fn param_tokens(krate: &Path, param: &ParamSpec) -> TokenStream {
    let name = LitStr::new(&param.name, param.span);

    let Some(header) = &param.header else {
        return quote!(#krate::Param::new(#name));
    };

    let alias = header.alias.as_ref().map(|alias| quote!(.alias(#alias)));
    let convert = header
        .convert_underscores
        .as_ref()
        .map(|enabled| quote!(.convert_underscores(#enabled)));

    quote! {
        #krate::Param::new(#name).marker(#krate::Header::new() #alias #convert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(item: ItemFn) -> String {
        expand_stream_handler(HandlerArgs::default(), item)
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_plain_parameters() {
        let output = expand(syn::parse_quote! {
            async fn on_event(record: ConsumerRecord, _unused: String) {}
        });

        assert!(output.contains("mod on_event"));
        assert!(output.contains("Param :: new (\"record\")"));
        assert!(output.contains("Param :: new (\"_unused\")"));
    }

    #[test]
    fn test_header_attributes_are_stripped() {
        let output = expand(syn::parse_quote! {
            pub async fn on_event(
                #[header(alias = "EventType")] kind: String,
                #[header(convert_underscores = false)] trace_id: Option<String>,
                #[header] source: String,
            ) {}
        });

        assert!(!output.contains("# [header"));
        assert!(output.contains("pub mod on_event"));
        assert!(output.contains(". alias (\"EventType\")"));
        assert!(output.contains(". convert_underscores (false)"));
        assert!(output.contains("Param :: new (\"source\") . marker (:: kstreams_framework :: Header :: new ())"));
    }

    #[test]
    fn test_tuple_struct_pattern() {
        let output = expand(syn::parse_quote! {
            async fn on_event(FromHeader(event_type): FromHeader<String>) {}
        });
        assert!(output.contains("Param :: new (\"event_type\")"));
    }

    #[test]
    fn test_custom_crate_path() {
        let args = HandlerArgs {
            krate: syn::parse_quote!(::kstreams::framework),
        };
        let output = expand_stream_handler(
            args,
            syn::parse_quote! { async fn on_event(record: ConsumerRecord) {} },
        )
        .unwrap()
        .to_string();
        assert!(output.contains(":: kstreams :: framework :: Param"));
    }

    #[test]
    fn test_crate_path_must_be_absolute() {
        let parse = |tokens: proc_macro2::TokenStream| {
            let mut args = HandlerArgs::default();
            syn::parse::Parser::parse2(syn::meta::parser(|meta| args.parse(meta)), tokens)
                .map(|()| args.krate)
        };

        assert!(parse(quote!(crate = "framework")).is_err());
        assert!(parse(quote!(crate = "super::framework")).is_err());

        let facade = parse(quote!(crate = "::kstreams::framework")).unwrap();
        assert!(facade.leading_colon.is_some());
        let local = parse(quote!(crate = "crate::framework")).unwrap();
        assert_eq!(local.segments.len(), 2);
    }

    #[test]
    fn test_leading_underscore_is_kept() {
        let output = expand(syn::parse_quote! {
            async fn literal(#[header(convert_underscores = false)] _trace_id: String) {}
        });
        assert!(output.contains("Param :: new (\"_trace_id\")"));
    }

    #[test]
    fn test_rejects_receivers_and_wildcards() {
        let method: ItemFn = syn::parse_quote! { async fn on_event(self) {} };
        assert!(expand_stream_handler(HandlerArgs::default(), method).is_err());

        let wildcard: ItemFn = syn::parse_quote! { async fn on_event(_: String) {} };
        assert!(expand_stream_handler(HandlerArgs::default(), wildcard).is_err());
    }

    #[test]
    fn test_rejects_unknown_header_argument() {
        let item: ItemFn = syn::parse_quote! {
            async fn on_event(#[header(name = "x")] kind: String) {}
        };
        assert!(expand_stream_handler(HandlerArgs::default(), item).is_err());
    }
}
