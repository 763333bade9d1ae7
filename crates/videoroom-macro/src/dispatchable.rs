//! `#[dispatchable]` macro implementation.

use inflector::Inflector;
use proc_macro::TokenStream;
use proc_macro2::{Group, Span, TokenStream as TokenStream2, TokenTree};
use quote::{quote, ToTokens as _};
use syn::{parse::Result, spanned::Spanned as _};

/// Transforms given name from `camelCase` to `snake_case` and adds `on_`
/// prefix.
fn to_handler_fn_name(name: &str) -> String {
    let mut snake_case = name.to_snake_case();
    snake_case.insert_str(0, "on_");
    snake_case
}

/// Receiver of the generated handler methods along with the type of the
/// handler accepted by the generated `dispatch_with()` method.
struct Receiver {
    /// `self` argument of every handler method.
    arg: TokenStream2,

    /// Type of the `handler` argument of `dispatch_with()`.
    handler_ty: TokenStream2,
}

impl Receiver {
    /// Parses [`Receiver`] from the `#[dispatchable(...)]` arguments.
    ///
    /// Defaults to `&mut self` when no arguments are given.
    fn parse(args: TokenStream) -> Result<Self> {
        if args.is_empty() {
            return Ok(Self {
                arg: quote! { &mut self },
                handler_ty: quote! { &mut T },
            });
        }

        let arg: syn::FnArg = syn::parse(args)?;
        match arg {
            syn::FnArg::Receiver(recv) => {
                let handler_ty = match (&recv.reference, &recv.mutability) {
                    (Some(_), Some(_)) => quote! { &mut T },
                    (Some(_), None) => quote! { &T },
                    (None, _) => quote! { T },
                };
                Ok(Self {
                    arg: recv.into_token_stream(),
                    handler_ty,
                })
            }
            syn::FnArg::Typed(pat_ty) => {
                let is_self = matches!(
                    &*pat_ty.pat,
                    syn::Pat::Ident(pat) if pat.ident == "self"
                );
                if !is_self {
                    return Err(syn::Error::new(
                        pat_ty.span(),
                        "expected `self` receiver, e.g. `self: &Self`",
                    ));
                }
                Ok(Self {
                    handler_ty: replace_self(pat_ty.ty.to_token_stream()),
                    arg: pat_ty.into_token_stream(),
                })
            }
        }
    }
}

/// Replaces every `Self` identifier in the provided tokens with `T`.
fn replace_self(tokens: TokenStream2) -> TokenStream2 {
    tokens
        .into_iter()
        .map(|tt| match tt {
            TokenTree::Ident(ident) if ident == "Self" => {
                TokenTree::Ident(syn::Ident::new("T", ident.span()))
            }
            TokenTree::Group(group) => {
                let mut replaced =
                    Group::new(group.delimiter(), replace_self(group.stream()));
                replaced.set_span(group.span());
                TokenTree::Group(replaced)
            }
            tt => tt,
        })
        .collect()
}

/// Generates the actual code for `#[dispatchable]` macro.
///
/// # Algorithm
///
/// 1. Generate dispatching `match`-arms for each `enum` variant.
/// 2. Generate trait methods signatures by transforming `enum` variant name
///    from `camelCase` to `snake_case` and add `on_` prefix.
/// 3. Generate trait `{enum_name}Handler` with generated methods from step 2.
/// 4. Generate method `dispatch_with()` with a dispatching generated on step 1.
pub fn expand(args: TokenStream, input: TokenStream) -> Result<TokenStream> {
    let receiver = Receiver::parse(args)?;
    let item_enum: syn::ItemEnum = syn::parse(input)?;

    let enum_ident = &item_enum.ident;
    let vis = &item_enum.vis;
    let handler_trait_ident = syn::Ident::new(
        &format!("{}Handler", enum_ident),
        Span::call_site(),
    );

    let mut dispatch_arms = Vec::with_capacity(item_enum.variants.len());
    let mut handler_methods = Vec::with_capacity(item_enum.variants.len());
    for variant in &item_enum.variants {
        let variant_ident = &variant.ident;
        let handler_fn_ident = syn::Ident::new(
            &to_handler_fn_name(&variant_ident.to_string()),
            Span::call_site(),
        );

        let (pattern, call_args, fn_args) = match &variant.fields {
            syn::Fields::Named(fields) => {
                let idents: Vec<_> = fields
                    .named
                    .iter()
                    .filter_map(|f| f.ident.clone())
                    .collect();
                let tys: Vec<_> = fields.named.iter().map(|f| &f.ty).collect();
                (
                    quote! { { #(#idents),* } },
                    quote! { #(#idents),* },
                    quote! { #(#idents: #tys),* },
                )
            }
            syn::Fields::Unnamed(fields) => {
                let idents: Vec<_> = (0..fields.unnamed.len())
                    .map(|i| {
                        syn::Ident::new(&format!("f{}", i), Span::call_site())
                    })
                    .collect();
                let tys: Vec<_> =
                    fields.unnamed.iter().map(|f| &f.ty).collect();
                (
                    quote! { ( #(#idents),* ) },
                    quote! { ( #(#idents),* ) },
                    quote! { data: ( #(#tys),* ) },
                )
            }
            syn::Fields::Unit => (quote! {}, quote! {}, quote! {}),
        };

        dispatch_arms.push(quote! {
            #enum_ident::#variant_ident #pattern => {
                handler.#handler_fn_ident(#call_args)
            },
        });

        let recv = &receiver.arg;
        let doc = format!(
            "Handles [`{0}::{1}`] variant of [`{0}`].",
            enum_ident, variant_ident,
        );
        handler_methods.push(quote! {
            #[doc = #doc]
            fn #handler_fn_ident(#recv, #fn_args) -> Self::Output;
        });
    }

    let trait_doc = format!(
        "Handler of [`{0}`] variants.\n\nUsing [`{0}::dispatch_with`] method \
         dispatches [`{0}`] variants to appropriate methods of this trait.",
        enum_ident,
    );
    let method_doc =
        format!("Dispatches [`{0}`] with given [`{0}Handler`].", enum_ident);
    let handler_ty = &receiver.handler_ty;

    let output = quote! {
        #item_enum

        #[doc = #trait_doc]
        #vis trait #handler_trait_ident {
            /// Output type of all functions from this trait.
            type Output;

            #(#handler_methods)*
        }

        #[automatically_derived]
        impl #enum_ident {
            #[doc = #method_doc]
            #vis fn dispatch_with<T: #handler_trait_ident>(
                self,
                handler: #handler_ty,
            ) -> <T as #handler_trait_ident>::Output {
                match self {
                    #(#dispatch_arms)*
                }
            }
        }
    };

    Ok(output.into())
}

#[cfg(test)]
mod to_handler_fn_name_spec {
    use super::to_handler_fn_name;

    #[test]
    fn converts_name_from_camel_case_to_snake_case() {
        for (name, expected) in &[
            ("JoinSuccess", "on_join_success"),
            ("PeerLeft", "on_peer_left"),
            ("TrackEncodingChanged", "on_track_encoding_changed"),
            ("RTCPeerConnection", "on_rtc_peer_connection"),
            ("testString", "on_test_string"),
            ("Some", "on_some"),
            ("S", "on_s"),
        ] {
            assert_eq!(to_handler_fn_name(name), *expected);
        }
    }
}
