//! Proc-macros for deriving resource interfaces:
//! - `Vertex`: vertex attribute layout of a `#[repr(C)]` struct
//! - `Arguments`: binding layout and binding set entries of a struct of resources
extern crate proc_macro;
extern crate quote;
extern crate syn;

use proc_macro2::{Span, TokenStream};
use quote::{quote, ToTokens, TokenStreamExt};
use syn::spanned::Spanned;

mod arguments;
mod vertex;

//--------------------------------------------------------------------------------------------------
struct CrateName;
const CRATE: CrateName = CrateName;

impl ToTokens for CrateName {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.append(syn::Ident::new("bindery", Span::call_site()))
    }
}

#[derive(Default, PartialEq, Eq)]
struct StageFlags {
    vertex: bool,
    fragment: bool,
    compute: bool,
    all: bool,
    all_graphics: bool,
}

impl StageFlags {
    fn all() -> Self {
        Self {
            all: true,
            ..Default::default()
        }
    }

    /// Parses the contents of `stages(...)`.
    fn parse_nested(meta: &syn::meta::ParseNestedMeta) -> syn::Result<StageFlags> {
        let mut stage_flags = StageFlags::default();
        meta.parse_nested_meta(|meta| {
            if meta.path.is_ident("vertex") {
                stage_flags.vertex = true;
                return Ok(());
            }
            if meta.path.is_ident("fragment") {
                stage_flags.fragment = true;
                return Ok(());
            }
            if meta.path.is_ident("compute") {
                stage_flags.compute = true;
                return Ok(());
            }
            if meta.path.is_ident("all_graphics") {
                stage_flags.all_graphics = true;
                return Ok(());
            }
            if meta.path.is_ident("all") {
                stage_flags.all = true;
                return Ok(());
            }
            Err(meta.error("invalid syntax for `stages(...)`"))
        })?;
        if stage_flags == StageFlags::default() {
            return Err(meta.error("no shader stages specified"));
        }
        Ok(stage_flags)
    }
}

impl ToTokens for StageFlags {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        if self.all {
            tokens.append_all(quote!(#CRATE::ShaderStages::ALL));
        } else if self.all_graphics {
            tokens.append_all(quote!(#CRATE::ShaderStages::ALL_GRAPHICS));
        } else {
            let mut tk = TokenStream::new();
            tk.append_all(quote!(#CRATE::ShaderStages::NONE.bits()));
            if self.vertex {
                tk.append_all(quote! { | #CRATE::ShaderStages::VERTEX.bits() });
            }
            if self.fragment {
                tk.append_all(quote! { | #CRATE::ShaderStages::FRAGMENT.bits() });
            }
            if self.compute {
                tk.append_all(quote! { | #CRATE::ShaderStages::COMPUTE.bits() });
            }
            tokens.append_all(quote!( #CRATE::ShaderStages::from_bits_retain(#tk)));
        }
    }
}

fn expect_struct_fields<'a>(input: &'a syn::DeriveInput, derive_name: &str) -> syn::Result<&'a syn::Fields> {
    match input.data {
        syn::Data::Struct(ref data_struct) => Ok(&data_struct.fields),
        _ => Err(syn::Error::new(
            input.span(),
            format!("`{derive_name}` can only be derived on structs"),
        )),
    }
}

//--------------------------------------------------------------------------------------------------

fn try_derive(
    input: proc_macro::TokenStream,
    f: fn(proc_macro::TokenStream) -> syn::Result<TokenStream>,
) -> proc_macro::TokenStream {
    match f(input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.into_compile_error().into(),
    }
}

#[proc_macro_derive(Vertex, attributes(normalized))]
pub fn vertex_derive(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    try_derive(input, vertex::derive_vertex)
}

#[proc_macro_derive(Arguments, attributes(argument))]
pub fn arguments_derive(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    try_derive(input, arguments::derive_arguments)
}
