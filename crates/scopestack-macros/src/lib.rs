//! Procedural macros for scopestack.
//!
//! This crate provides the `#[stack_scope]` attribute, which opens a
//! `StackScope` for the duration of a function body.

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::{Expr, Ident, ItemFn, Token, parse_macro_input};

/// Wraps a function body in a stack scope.
///
/// Everything allocated through the bound handle is released when the
/// function returns, whichever way it returns.
///
/// - `#[stack_scope]` binds the scope as `stack` on the thread's stack.
/// - `#[stack_scope(tmp)]` binds it as `tmp`.
/// - `#[stack_scope(tmp, arena = expr)]` opens it on an explicit `ArenaState`.
///
/// # Example
/// ```ignore
/// use scopestack::stack_scope;
///
/// #[stack_scope]
/// fn checksum(data: &[u8]) -> Result<u32, scopestack::StackError> {
///     let scratch = stack.alloc_copy(data)?;
///     Ok(unsafe { std::slice::from_raw_parts(scratch.as_ptr(), data.len()) }
///         .iter()
///         .map(|b| *b as u32)
///         .sum())
/// }
/// ```
#[proc_macro_attribute]
pub fn stack_scope(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as ScopeArgs);
    let function = parse_macro_input!(item as ItemFn);

    match expand(args, function) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand(args: ScopeArgs, function: ItemFn) -> syn::Result<proc_macro2::TokenStream> {
    if let Some(asyncness) = &function.sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "stack_scope: async functions may resume on another thread",
        ));
    }

    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = function;
    let binding = args.binding;
    let open = match args.arena {
        Some(arena) => quote! { ::scopestack::StackScope::from_arena(&(#arena)) },
        None => quote! { ::scopestack::StackScope::new() },
    };

    Ok(quote! {
        #(#attrs)*
        #vis #sig {
            #[allow(unused_variables)]
            let #binding = #open;
            #block
        }
    })
}

struct ScopeArgs {
    binding: Ident,
    arena: Option<Expr>,
}

impl Parse for ScopeArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut binding = None;
        let mut arena = None;

        while !input.is_empty() {
            if input.peek(Ident) && input.peek2(Token![=]) {
                let key: Ident = input.parse()?;
                input.parse::<Token![=]>()?;
                if key != "arena" {
                    return Err(syn::Error::new(
                        key.span(),
                        format!("stack_scope: unknown option `{}`", key),
                    ));
                }
                arena = Some(input.parse::<Expr>()?);
            } else if binding.is_none() {
                binding = Some(input.parse::<Ident>()?);
            } else {
                return Err(input.error("stack_scope: expected `arena = <expr>`"));
            }

            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(Self {
            binding: binding.unwrap_or_else(|| Ident::new("stack", Span::call_site())),
            arena,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_err(attr: &str) -> String {
        match syn::parse_str::<ScopeArgs>(attr) {
            Ok(_) => panic!("`{}` should not parse", attr),
            Err(e) => e.to_string(),
        }
    }

    fn expand_str(attr: &str, item: &str) -> syn::Result<String> {
        let args = syn::parse_str::<ScopeArgs>(attr)?;
        let function = syn::parse_str::<ItemFn>(item)?;
        expand(args, function).map(|tokens| tokens.to_string().replace(' ', ""))
    }

    #[test]
    fn test_default_binding() {
        let args = syn::parse_str::<ScopeArgs>("").unwrap();
        assert_eq!(args.binding, "stack");
        assert!(args.arena.is_none());
    }

    #[test]
    fn test_named_binding_with_arena() {
        let args = syn::parse_str::<ScopeArgs>("tmp, arena = ctx.arena").unwrap();
        assert_eq!(args.binding, "tmp");
        assert!(args.arena.is_some());
    }

    #[test]
    fn test_unknown_option_rejected() {
        assert_eq!(
            parse_err("tmp, size = 4"),
            "stack_scope: unknown option `size`"
        );
    }

    #[test]
    fn test_second_binding_rejected() {
        assert_eq!(
            parse_err("tmp, other"),
            "stack_scope: expected `arena = <expr>`"
        );
    }

    #[test]
    fn test_async_fn_rejected() {
        let err = expand_str("", "async fn load() -> u32 { 1 }").unwrap_err();
        assert_eq!(
            err.to_string(),
            "stack_scope: async functions may resume on another thread"
        );
    }

    #[test]
    fn test_expansion_opens_scope() {
        let thread = expand_str("", "fn f() -> usize { stack.used() }").unwrap();
        assert!(thread.contains("letstack=::scopestack::StackScope::new();"));

        let explicit = expand_str("s, arena = a", "fn g(a: &ArenaState) {}").unwrap();
        assert!(explicit.contains("lets=::scopestack::StackScope::from_arena(&(a));"));
    }
}
