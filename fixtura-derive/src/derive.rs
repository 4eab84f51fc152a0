//! Implementation of `#[derive(Fixture)]`.
//!
//! For a struct with named fields the derive emits a hidden inherent impl
//! holding one setter per attribute, one invoker per declared initializer and,
//! when a field is marked `#[fixture(base)]`, the projection and upcast
//! functions for the supertype link. The `Typed` impl then assembles these into
//! a `TypeInfo` built once per process.
//!
//! For a fieldless enum the derive emits `Typed` and `Enumerable`.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    Attribute, Data, DataEnum, DeriveInput, Error, Fields, FieldsNamed, GenericArgument, Ident,
    Path, PathArguments, Result, Token, Type, parenthesized, parse_macro_input,
};

/// Main entry point for the Fixture derive macro
pub fn derive_fixture_impl(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match generate_fixture_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn generate_fixture_impl(input: &DeriveInput) -> Result<TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "Fixture derive is not supported for generic types",
        ));
    }

    match &input.data {
        Data::Struct(data_struct) => match &data_struct.fields {
            Fields::Named(fields) => generate_struct_impl(input, Some(fields)),
            Fields::Unit => generate_struct_impl(input, None),
            Fields::Unnamed(_) => Err(Error::new_spanned(
                &input.ident,
                "Fixture derive requires named fields",
            )),
        },
        Data::Enum(data_enum) => generate_enum_impl(&input.ident, data_enum),
        Data::Union(_) => Err(Error::new_spanned(
            input,
            "Fixture derive is not supported for unions",
        )),
    }
}

/// How a field takes part in the type's table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldRole {
    Attribute,
    Base,
    Skip,
}

/// An initializer declared with `#[fixture(init(path, Type, ...))]`
struct InitDecl {
    path: Path,
    params: Vec<Type>,
}

fn generate_struct_impl(input: &DeriveInput, fields: Option<&FieldsNamed>) -> Result<TokenStream> {
    let name = &input.ident;
    let type_name = name.to_string();

    let mut helpers = Vec::new();
    let mut attributes = Vec::new();
    let mut supertype = None;

    for field in fields.into_iter().flat_map(|fields| fields.named.iter()) {
        let Some(ident) = &field.ident else {
            continue;
        };
        let ty = &field.ty;

        match parse_field_role(&field.attrs)? {
            FieldRole::Skip => {}
            FieldRole::Base => {
                if supertype.is_some() {
                    return Err(Error::new_spanned(
                        ident,
                        "only one field can be marked #[fixture(base)]",
                    ));
                }
                helpers.push(quote! {
                    #[doc(hidden)]
                    fn __fixtura_project(
                        target: &mut dyn ::std::any::Any,
                    ) -> ::std::option::Option<&mut dyn ::std::any::Any> {
                        target
                            .downcast_mut::<Self>()
                            .map(|this| &mut this.#ident as &mut dyn ::std::any::Any)
                    }

                    #[doc(hidden)]
                    fn __fixtura_upcast(
                        value: ::fixtura::reflect::DynValue,
                    ) -> ::std::option::Option<::fixtura::reflect::DynValue> {
                        ::fixtura::reflect::into_typed::<Self>(value).ok().map(|this| {
                            ::std::boxed::Box::new(this.#ident) as ::fixtura::reflect::DynValue
                        })
                    }
                });
                supertype = Some(quote! {
                    .with_supertype(::fixtura::reflect::Supertype::new(
                        <#ty as ::fixtura::reflect::Typed>::static_type_info,
                        #name::__fixtura_project,
                        #name::__fixtura_upcast,
                    ))
                });
            }
            FieldRole::Attribute => {
                let attribute_name = ident.to_string().trim_start_matches("r#").to_string();
                let setter = format_ident!("__fixtura_set_{}", ident);
                let (value_type, nullable) = split_option(ty);
                let take = take_fn(nullable);

                helpers.push(quote! {
                    #[doc(hidden)]
                    fn #setter(
                        target: &mut dyn ::std::any::Any,
                        value: ::std::option::Option<::fixtura::reflect::DynValue>,
                    ) -> ::fixtura::error::FixtureResult<()> {
                        ::fixtura::reflect::downcast_target::<Self>(target)?.#ident =
                            ::fixtura::reflect::#take::<#value_type>(value)?;
                        ::std::result::Result::Ok(())
                    }
                });
                attributes.push(quote! {
                    .with_attribute(::fixtura::reflect::AttributeInfo::new(
                        #attribute_name,
                        <#value_type as ::fixtura::reflect::Typed>::static_type_info,
                        #nullable,
                        #name::#setter,
                    ))
                });
            }
        }
    }

    let mut initializers = Vec::new();
    for (index, init) in parse_init_decls(&input.attrs)?.iter().enumerate() {
        let invoker = format_ident!("__fixtura_init_{}", index);
        let init_name = init
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string())
            .unwrap_or_default();
        let path = &init.path;

        let mut params = Vec::new();
        let mut bindings = Vec::new();
        let mut args = Vec::new();
        for (position, ty) in init.params.iter().enumerate() {
            let (value_type, nullable) = split_option(ty);
            let take = take_fn(nullable);
            let arg = format_ident!("__arg{}", position);

            params.push(quote! {
                ::fixtura::reflect::Param::new(
                    <#value_type as ::fixtura::reflect::Typed>::static_type_info,
                    #nullable,
                )
            });
            bindings.push(quote! {
                let #arg = ::fixtura::reflect::#take::<#value_type>(
                    ::fixtura::reflect::next_argument(&mut arguments)?,
                )?;
            });
            args.push(arg);
        }

        helpers.push(quote! {
            #[doc(hidden)]
            fn #invoker(
                arguments: ::std::vec::Vec<::std::option::Option<::fixtura::reflect::DynValue>>,
            ) -> ::fixtura::error::FixtureResult<::fixtura::reflect::DynValue> {
                #[allow(unused_mut, unused_variables)]
                let mut arguments = arguments.into_iter();
                #(#bindings)*
                ::std::result::Result::Ok(
                    ::std::boxed::Box::new(#path(#(#args),*)) as ::fixtura::reflect::DynValue
                )
            }
        });
        initializers.push(quote! {
            .with_initializer(::fixtura::reflect::Initializer::new(
                #init_name,
                ::std::vec![#(#params),*],
                #name::#invoker,
            ))
        });
    }

    Ok(quote! {
        impl #name {
            #(#helpers)*
        }

        impl ::fixtura::reflect::Typed for #name {
            fn static_type_info() -> &'static ::fixtura::reflect::TypeInfo {
                static INFO: ::std::sync::OnceLock<::fixtura::reflect::TypeInfo> =
                    ::std::sync::OnceLock::new();
                INFO.get_or_init(|| {
                    ::fixtura::reflect::TypeInfo::of::<#name>(#type_name)
                        #supertype
                        #(#attributes)*
                        #(#initializers)*
                })
            }
        }
    })
}

fn generate_enum_impl(name: &Ident, data_enum: &DataEnum) -> Result<TokenStream> {
    if data_enum.variants.is_empty() {
        return Err(Error::new_spanned(
            name,
            "Fixture derive requires at least one enum variant",
        ));
    }

    let mut variants = Vec::new();
    for variant in &data_enum.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(Error::new_spanned(
                variant,
                "Fixture derive only supports enums whose variants have no fields",
            ));
        }
        variants.push(&variant.ident);
    }
    let type_name = name.to_string();

    Ok(quote! {
        impl ::fixtura::reflect::Typed for #name {
            fn static_type_info() -> &'static ::fixtura::reflect::TypeInfo {
                static INFO: ::std::sync::OnceLock<::fixtura::reflect::TypeInfo> =
                    ::std::sync::OnceLock::new();
                INFO.get_or_init(|| ::fixtura::reflect::TypeInfo::of::<#name>(#type_name))
            }
        }

        impl ::fixtura::reflect::Enumerable for #name {
            fn variants() -> ::std::vec::Vec<Self> {
                ::std::vec![#(#name::#variants),*]
            }
        }
    })
}

/// Parse `#[fixture(base)]` / `#[fixture(skip)]` on a field
fn parse_field_role(attrs: &[Attribute]) -> Result<FieldRole> {
    let mut role = FieldRole::Attribute;

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("fixture")) {
        attr.parse_nested_meta(|meta| {
            let next = if meta.path.is_ident("base") {
                FieldRole::Base
            } else if meta.path.is_ident("skip") {
                FieldRole::Skip
            } else {
                return Err(meta.error("expected `base` or `skip`"));
            };
            if role != FieldRole::Attribute && role != next {
                return Err(meta.error("a field cannot be both `base` and `skip`"));
            }
            role = next;
            Ok(())
        })?;
    }

    Ok(role)
}

/// Parse every `#[fixture(init(path, Type, ...))]` on the type, in order
fn parse_init_decls(attrs: &[Attribute]) -> Result<Vec<InitDecl>> {
    let mut inits = Vec::new();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("fixture")) {
        attr.parse_nested_meta(|meta| {
            if !meta.path.is_ident("init") {
                return Err(meta.error("expected `init(path, Type, ...)`"));
            }

            let content;
            parenthesized!(content in meta.input);
            let path: Path = content.parse()?;
            let mut params = Vec::new();
            while !content.is_empty() {
                content.parse::<Token![,]>()?;
                if content.is_empty() {
                    break;
                }
                params.push(content.parse::<Type>()?);
            }

            inits.push(InitDecl { path, params });
            Ok(())
        })?;
    }

    Ok(inits)
}

/// `Option<X>` becomes `(X, true)`; any other type `(T, false)`
fn split_option(ty: &Type) -> (&Type, bool) {
    if let Type::Path(type_path) = ty
        && type_path.qself.is_none()
        && let Some(segment) = type_path.path.segments.last()
        && segment.ident == "Option"
        && let PathArguments::AngleBracketed(arguments) = &segment.arguments
        && arguments.args.len() == 1
        && let Some(GenericArgument::Type(inner)) = arguments.args.first()
    {
        return (inner, true);
    }
    (ty, false)
}

fn take_fn(nullable: bool) -> Ident {
    if nullable {
        format_ident!("take_nullable")
    } else {
        format_ident!("take_required")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_split_option() {
        let optional: Type = parse_quote! { Option<String> };
        let (inner, nullable) = split_option(&optional);
        assert!(nullable);
        assert_eq!(quote!(#inner).to_string(), "String");

        let qualified: Type = parse_quote! { std::option::Option<i32> };
        assert!(split_option(&qualified).1);

        let plain: Type = parse_quote! { i32 };
        assert!(!split_option(&plain).1);
    }

    #[test]
    fn test_parse_field_role() {
        let base: Vec<Attribute> = vec![parse_quote! { #[fixture(base)] }];
        let skip: Vec<Attribute> = vec![parse_quote! { #[fixture(skip)] }];
        let other: Vec<Attribute> = vec![parse_quote! { #[serde(rename = "x")] }];
        let unknown: Vec<Attribute> = vec![parse_quote! { #[fixture(rename)] }];

        assert_eq!(parse_field_role(&base).unwrap(), FieldRole::Base);
        assert_eq!(parse_field_role(&skip).unwrap(), FieldRole::Skip);
        assert_eq!(parse_field_role(&other).unwrap(), FieldRole::Attribute);
        assert!(parse_field_role(&unknown).is_err());
    }

    #[test]
    fn test_parse_init_decls() {
        let attrs: Vec<Attribute> = vec![
            parse_quote! { #[fixture(init(Self::new, String))] },
            parse_quote! { #[fixture(init(Self::empty))] },
            parse_quote! { #[fixture(init(make_pair, Option<i32>, i64,))] },
        ];
        let inits = parse_init_decls(&attrs).unwrap();

        assert_eq!(inits.len(), 3);
        assert_eq!(inits[0].params.len(), 1);
        assert!(inits[1].params.is_empty());
        assert_eq!(inits[2].params.len(), 2);
        let path = &inits[2].path;
        assert_eq!(quote!(#path).to_string(), "make_pair");
    }

    #[test]
    fn test_struct_impl_tokens() {
        let input: DeriveInput = parse_quote! {
            #[fixture(init(Self::new, Option<String>))]
            struct Person {
                #[fixture(base)]
                base: Named,
                nickname: Option<String>,
                age: i32,
                #[fixture(skip)]
                cache: Vec<u8>,
            }
        };
        let tokens = generate_fixture_impl(&input).unwrap().to_string();

        assert!(tokens.contains("__fixtura_set_nickname"));
        assert!(tokens.contains("__fixtura_set_age"));
        assert!(!tokens.contains("__fixtura_set_cache"));
        assert!(!tokens.contains("__fixtura_set_base"));
        assert!(tokens.contains("__fixtura_project"));
        assert!(tokens.contains("__fixtura_init_0"));
        assert!(tokens.contains("take_nullable :: < String >"));
        assert!(tokens.contains("take_required :: < i32 >"));
    }

    #[test]
    fn test_enum_impl_tokens() {
        let input: DeriveInput = parse_quote! {
            enum Color { Red, Green }
        };
        let tokens = generate_fixture_impl(&input).unwrap().to_string();
        assert!(tokens.contains("Enumerable for Color"));
        assert!(tokens.contains("Color :: Red , Color :: Green"));
    }

    #[test]
    fn test_rejected_inputs() {
        let generic: DeriveInput = parse_quote! { struct Wrapper<T> { value: T } };
        let tuple: DeriveInput = parse_quote! { struct Pair(i32, i32); };
        let data_enum: DeriveInput = parse_quote! { enum Shape { Circle(f64) } };
        let two_bases: DeriveInput = parse_quote! {
            struct Twice {
                #[fixture(base)]
                a: A,
                #[fixture(base)]
                b: B,
            }
        };

        assert!(generate_fixture_impl(&generic).is_err());
        assert!(generate_fixture_impl(&tuple).is_err());
        assert!(generate_fixture_impl(&data_enum).is_err());
        assert!(generate_fixture_impl(&two_bases).is_err());
    }
}
