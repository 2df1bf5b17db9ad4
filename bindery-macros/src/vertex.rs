use crate::{expect_struct_fields, CRATE};
use proc_macro2::TokenStream;
use quote::quote;
use syn::spanned::Spanned;

/// Returns whether the struct carries `#[repr(C)]`.
fn has_repr_c(input: &syn::DeriveInput) -> syn::Result<bool> {
    let mut repr_c = false;
    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("repr")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("C") {
                repr_c = true;
            } else if meta.input.peek(syn::token::Paren) {
                // `align(N)`, `packed(N)`
                let content;
                syn::parenthesized!(content in meta.input);
                content.parse::<TokenStream>()?;
            }
            Ok(())
        })?;
    }
    Ok(repr_c)
}

pub(crate) fn derive_vertex(input: proc_macro::TokenStream) -> syn::Result<TokenStream> {
    let derive_input: syn::DeriveInput = syn::parse(input)?;
    let fields = expect_struct_fields(&derive_input, "Vertex")?;

    // attribute offsets are only meaningful with a stable field order
    if !has_repr_c(&derive_input)? {
        return Err(syn::Error::new(
            derive_input.ident.span(),
            "`Vertex` can only be derived on `#[repr(C)]` structs",
        ));
    }
    if fields.is_empty() {
        return Err(syn::Error::new(
            derive_input.span(),
            "`Vertex` needs at least one attribute field",
        ));
    }

    let struct_name = &derive_input.ident;

    let mut attribute_descs = vec![];
    for (i, f) in fields.iter().enumerate() {
        let field_ty = &f.ty;

        let mut normalized = false;
        for attr in f.attrs.iter().filter(|attr| attr.path().is_ident("normalized")) {
            attr.meta.require_path_only()?;
            normalized = true;
        }

        let format = if normalized {
            quote!(<#CRATE::Norm<#field_ty> as #CRATE::VertexAttribute>::FORMAT)
        } else {
            quote!(<#field_ty as #CRATE::VertexAttribute>::FORMAT)
        };

        let offset = match f.ident {
            Some(ref ident) => quote!(#CRATE::__offset_of!(#struct_name, #ident)),
            None => {
                let index = syn::Index::from(i);
                quote!(#CRATE::__offset_of_tuple!(#struct_name, #index))
            }
        };

        attribute_descs.push(quote! {
            #CRATE::VertexAttributeDescription {
                format: #format,
                offset: #offset as u32,
            }
        });
    }

    let (impl_generics, ty_generics, where_clause) = derive_input.generics.split_for_impl();

    Ok(quote! {
        unsafe impl #impl_generics #CRATE::Vertex for #struct_name #ty_generics #where_clause {
            const ATTRIBUTES: &'static [#CRATE::VertexAttributeDescription] = &[#(#attribute_descs,)*];
        }
    })
}
