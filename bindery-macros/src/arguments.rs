use crate::{expect_struct_fields, StageFlags, CRATE};
use proc_macro2::TokenStream;
use quote::quote;
use syn::spanned::Spanned;

#[derive(Copy, Clone, PartialEq, Eq)]
enum ArgumentKind {
    SampledImage,
    Sampler,
    Uniform,
    Storage,
}

/// Parsed contents of a `#[argument(...)]` attribute.
#[derive(Default)]
struct ArgumentAttr {
    binding: Option<u32>,
    kind: Option<ArgumentKind>,
    read_only: bool,
    read_write: bool,
    stages: Option<StageFlags>,
}

impl ArgumentAttr {
    fn parse(attr: &syn::Attribute) -> syn::Result<ArgumentAttr> {
        let mut r = ArgumentAttr::default();
        attr.meta.require_list()?.parse_nested_meta(|meta| {
            if meta.path.is_ident("binding") {
                let value = meta.value()?;
                let index: syn::LitInt = value.parse()?;
                r.binding = Some(index.base10_parse()?);
                return Ok(());
            }
            if meta.path.is_ident("stages") {
                r.stages = Some(StageFlags::parse_nested(&meta)?);
                return Ok(());
            }
            if meta.path.is_ident("read_only") {
                r.read_only = true;
                return Ok(());
            }
            if meta.path.is_ident("read_write") {
                r.read_write = true;
                return Ok(());
            }

            let kind = if meta.path.is_ident("sampled_image") {
                ArgumentKind::SampledImage
            } else if meta.path.is_ident("sampler") {
                ArgumentKind::Sampler
            } else if meta.path.is_ident("uniform") {
                ArgumentKind::Uniform
            } else if meta.path.is_ident("storage") {
                ArgumentKind::Storage
            } else {
                return Err(meta.error("invalid syntax for `#[argument]`"));
            };
            if r.kind.is_some() {
                return Err(meta.error(
                    "`sampled_image`, `sampler`, `uniform` and `storage` are mutually exclusive",
                ));
            }
            r.kind = Some(kind);
            Ok(())
        })?;
        Ok(r)
    }
}

pub(crate) fn derive_arguments(input: proc_macro::TokenStream) -> syn::Result<TokenStream> {
    let derive_input: syn::DeriveInput = syn::parse(input)?;
    let fields = expect_struct_fields(&derive_input, "Arguments")?;

    // The layout is a constant of the type: it can't depend on type parameters.
    if derive_input.generics.type_params().count() != 0 || derive_input.generics.const_params().count() != 0 {
        return Err(syn::Error::new(
            derive_input.generics.span(),
            "generic parameters are not supported on structs with `#[derive(Arguments)]`",
        ));
    }

    // `BindingLayoutEntry { .. }, BindingLayoutEntry { .. }, ...`
    let mut layout_entries = vec![];
    // `BindingSetEntry { binding, resource: Argument::binding_resource(&self.field) }, ...`
    let mut set_entries = vec![];

    let mut next_binding_index: u32 = 0;

    for (i, f) in fields.iter().enumerate() {
        let member = if let Some(ref ident) = f.ident {
            syn::Member::from(ident.clone())
        } else {
            syn::Member::from(i)
        };

        let mut attrs = f.attrs.iter().filter(|attr| attr.path().is_ident("argument"));
        let Some(attr) = attrs.next() else {
            return Err(syn::Error::new(f.span(), "missing `#[argument(...)]` attribute"));
        };
        if let Some(extra) = attrs.next() {
            return Err(syn::Error::new(extra.span(), "duplicate `#[argument(...)]` attribute"));
        }
        let arg = ArgumentAttr::parse(attr)?;

        if arg.read_only && arg.read_write {
            return Err(syn::Error::new(
                attr.span(),
                "`read_only` and `read_write` are mutually exclusive",
            ));
        }

        let binding_index = arg.binding.unwrap_or(next_binding_index);
        if binding_index < next_binding_index {
            return Err(syn::Error::new(
                attr.span(),
                format!(
                    "binding index must be increasing: last binding index was {}",
                    next_binding_index - 1
                ),
            ));
        }
        next_binding_index = binding_index + 1;

        let ty = match arg.kind {
            Some(ArgumentKind::SampledImage) => quote!(#CRATE::BindingType::SampledTexture),
            Some(ArgumentKind::Sampler) => quote!(#CRATE::BindingType::Sampler),
            Some(ArgumentKind::Uniform) => quote!(#CRATE::BindingType::UniformBuffer),
            Some(ArgumentKind::Storage) => {
                // read-only by default
                let read_only = !arg.read_write;
                quote!(#CRATE::BindingType::StorageBuffer { read_only: #read_only })
            }
            None => {
                return Err(syn::Error::new(
                    attr.span(),
                    "missing argument type; must be `sampled_image`, `sampler`, `uniform` or `storage`",
                ))
            }
        };
        if (arg.read_only || arg.read_write) && arg.kind != Some(ArgumentKind::Storage) {
            return Err(syn::Error::new(
                attr.span(),
                "`read_only` and `read_write` only apply to `storage` arguments",
            ));
        }

        let visibility = arg.stages.unwrap_or_else(StageFlags::all);

        layout_entries.push(quote! {
            #CRATE::BindingLayoutEntry {
                binding: #binding_index,
                visibility: #visibility,
                ty: #ty,
            }
        });
        set_entries.push(quote! {
            #CRATE::BindingSetEntry {
                binding: #binding_index,
                resource: #CRATE::Argument::binding_resource(&self.#member),
            }
        });
    }

    let struct_name = &derive_input.ident;
    let (impl_generics, ty_generics, where_clause) = derive_input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #CRATE::StaticArguments for #struct_name #ty_generics #where_clause {
            const LAYOUT: &'static [#CRATE::BindingLayoutEntry] = &[#(#layout_entries,)*];
        }

        impl #impl_generics #CRATE::Arguments for #struct_name #ty_generics #where_clause {
            fn entries(&self) -> ::std::vec::Vec<#CRATE::BindingSetEntry<'_>> {
                ::std::vec![#(#set_entries,)*]
            }
        }
    })
}
