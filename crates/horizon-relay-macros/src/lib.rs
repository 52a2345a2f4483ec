//! Procedural macros for Horizon Relay models.
//!
//! This crate provides the `#[derive(Model)]` macro, which generates the
//! `Model` implementation and named setter dispatch for a struct.
//!
//! # Attributes
//!
//! ## `#[property]`
//!
//! Marks a `Property<T>` field as a model property:
//!
//! ```ignore
//! #[derive(Model)]
//! struct Scale {
//!     base: ModelBase,
//!
//!     #[property]
//!     weight: Property<f64>,
//!
//!     #[property(name = "Unit")]
//!     unit_label: Property<String>,
//!
//!     #[property(read_only)]
//!     serial: Property<u32>,
//! }
//! ```
//!
//! Property attributes:
//! - `name = "Name"`: The property name used in events and setter operations
//!   (defaults to the PascalCase field name)
//! - `read_only`: No setter operation is generated
//! - `skip`: Excludes the field entirely
//!
//! ## `#[model]`
//!
//! Struct-level attribute for model configuration:
//!
//! ```ignore
//! #[derive(Model)]
//! #[model(prefix = "apply")]  // operations become "applyWeight", ...
//! struct Scale {
//!     // ...
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    Attribute, Data, DeriveInput, Field, Fields, Ident, LitStr, Meta, Type, parse_macro_input,
};

const DEFAULT_PREFIX: &str = "set";

/// Derive the `Model` trait with named, type-guarded setter dispatch.
///
/// This macro generates:
/// - `model_base`, returning the `base` field
/// - `invoke_setter`, matching `"set" + Name` operations and downcasting the
///   value to the property's type
/// - `setter_operations`, listing the generated operation names
/// - a typed `set_<field>` method per writable property, returning whether
///   the value changed
///
/// A generated setter writes the property and, only when the value actually
/// changed, fires a change event carrying the old and new values.
///
/// # Example
///
/// ```ignore
/// use horizon_relay::prelude::*;
///
/// #[derive(Model)]
/// struct Scale {
///     base: ModelBase,
///
///     #[property]
///     weight: Property<f64>,
/// }
/// ```
#[proc_macro_derive(Model, attributes(model, property))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match impl_derive_model(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Parsed property information.
struct PropertyInfo {
    field_name: Ident,
    inner_type: Type,
    property_name: String,
    read_only: bool,
}

/// Parsed struct-level model attributes.
struct ModelAttrs {
    prefix: String,
}

fn impl_derive_model(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let model_attrs = parse_model_attrs(&input.attrs)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Model derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Model derive only supports structs",
            ));
        }
    };

    if !fields
        .iter()
        .any(|f| f.ident.as_ref().is_some_and(|i| i == "base"))
    {
        return Err(syn::Error::new_spanned(
            input,
            "Model derive requires a `base: ModelBase` field",
        ));
    }

    let mut properties = Vec::new();
    for field in fields.iter() {
        if let Some(info) = parse_property_field(field)? {
            properties.push(info);
        }
    }

    let writable: Vec<&PropertyInfo> = properties.iter().filter(|p| !p.read_only).collect();

    let mut operations: Vec<String> = writable
        .iter()
        .map(|p| format!("{}{}", model_attrs.prefix, p.property_name))
        .collect();
    operations.sort();
    if let Some(duplicate) = operations.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(syn::Error::new_spanned(
            input,
            format!("duplicate setter operation `{}`", duplicate[0]),
        ));
    }

    let setter_arms = writable.iter().map(|prop| {
        let field_name = &prop.field_name;
        let inner_type = &prop.inner_type;
        let property_name = &prop.property_name;
        let operation = format!("{}{}", model_attrs.prefix, prop.property_name);

        quote! {
            #operation => {
                let new_value = value.downcast_ref::<#inner_type>().ok_or_else(|| {
                    horizon_relay_core::DispatchError::type_mismatch(operation, value.type_name())
                })?;
                if let Some(old_value) = self.#field_name.replace(::std::clone::Clone::clone(new_value)) {
                    horizon_relay_core::Model::fire_change(
                        self,
                        #property_name,
                        Some(horizon_relay_core::PropertyValue::new(old_value)),
                        Some(::std::clone::Clone::clone(value)),
                    );
                }
                Ok(())
            }
        }
    });

    let typed_setters = writable.iter().map(|prop| {
        let field_name = &prop.field_name;
        let inner_type = &prop.inner_type;
        let property_name = &prop.property_name;
        let method_name = format_ident!("set_{}", field_name.to_string().trim_start_matches("r#"));
        let doc = format!("Set `{property_name}`, firing a change event if the value changed.");

        quote! {
            #[doc = #doc]
            pub fn #method_name(&self, value: #inner_type) -> bool {
                let new_value = horizon_relay_core::PropertyValue::new(::std::clone::Clone::clone(&value));
                match self.#field_name.replace(value) {
                    Some(old_value) => {
                        horizon_relay_core::Model::fire_change(
                            self,
                            #property_name,
                            Some(horizon_relay_core::PropertyValue::new(old_value)),
                            Some(new_value),
                        );
                        true
                    }
                    None => false,
                }
            }
        }
    });

    let expanded = quote! {
        impl #impl_generics #struct_name #ty_generics #where_clause {
            #(#typed_setters)*
        }

        impl #impl_generics horizon_relay_core::Model for #struct_name #ty_generics #where_clause {
            fn model_base(&self) -> &horizon_relay_core::ModelBase {
                &self.base
            }

            #[allow(unused_variables)]
            fn invoke_setter(
                &self,
                operation: &str,
                value: &horizon_relay_core::PropertyValue,
            ) -> horizon_relay_core::DispatchResult<()> {
                match operation {
                    #(#setter_arms)*
                    _ => Err(horizon_relay_core::DispatchError::no_such_operation(operation)),
                }
            }

            fn setter_operations(&self) -> ::std::vec::Vec<::std::string::String> {
                ::std::vec![#(::std::string::String::from(#operations)),*]
            }
        }
    };

    Ok(expanded)
}

/// Parse struct-level #[model(...)] attributes.
fn parse_model_attrs(attrs: &[Attribute]) -> syn::Result<ModelAttrs> {
    let mut result = ModelAttrs {
        prefix: DEFAULT_PREFIX.to_string(),
    };

    for attr in attrs {
        if !attr.path().is_ident("model") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("prefix") {
                let prefix: LitStr = meta.value()?.parse()?;
                result.prefix = prefix.value();
                Ok(())
            } else {
                Err(meta.error("unsupported model attribute, expected `prefix`"))
            }
        })?;
    }

    Ok(result)
}

/// Parse a field with a #[property] attribute.
fn parse_property_field(field: &Field) -> syn::Result<Option<PropertyInfo>> {
    let field_name = match &field.ident {
        Some(name) => name.clone(),
        None => return Ok(None),
    };

    if field_name == "base" {
        return Ok(None);
    }

    let mut has_property_attr = false;
    let mut property_name = None;
    let mut read_only = false;
    let mut skip = false;

    for attr in &field.attrs {
        if !attr.path().is_ident("property") {
            continue;
        }
        has_property_attr = true;

        // Bare #[property] has no nested meta to parse.
        if !matches!(attr.meta, Meta::List(_)) {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let name: LitStr = meta.value()?.parse()?;
                property_name = Some(name.value());
            } else if meta.path.is_ident("read_only") {
                read_only = true;
            } else if meta.path.is_ident("skip") {
                skip = true;
            } else {
                return Err(meta.error(
                    "unsupported property attribute, expected `name`, `read_only` or `skip`",
                ));
            }
            Ok(())
        })?;
    }

    if !has_property_attr || skip {
        return Ok(None);
    }

    let inner_type = extract_property_type(&field.ty).ok_or_else(|| {
        syn::Error::new_spanned(&field.ty, "#[property] fields must have type `Property<T>`")
    })?;

    let property_name =
        property_name.unwrap_or_else(|| to_pascal_case(&field_name.to_string()));

    Ok(Some(PropertyInfo {
        field_name,
        inner_type,
        property_name,
        read_only,
    }))
}

/// Extract `T` from `Property<T>`.
fn extract_property_type(ty: &Type) -> Option<Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Property" {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        syn::GenericArgument::Type(inner) => Some(inner.clone()),
        _ => None,
    }
}

/// Convert a snake_case field name to PascalCase.
fn to_pascal_case(name: &str) -> String {
    name.trim_start_matches("r#")
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_pascal_case() {
        assert_eq!(to_pascal_case("weight"), "Weight");
        assert_eq!(to_pascal_case("unit_label"), "UnitLabel");
        assert_eq!(to_pascal_case("_private__x"), "PrivateX");
        assert_eq!(to_pascal_case("r#type"), "Type");
    }

    #[test]
    fn test_extract_property_type() {
        let ty: Type = syn::parse_quote!(Property<f64>);
        let inner = extract_property_type(&ty).unwrap();
        assert_eq!(quote!(#inner).to_string(), "f64");

        let ty: Type = syn::parse_quote!(horizon_relay::Property<Vec<String>>);
        assert!(extract_property_type(&ty).is_some());

        let ty: Type = syn::parse_quote!(f64);
        assert!(extract_property_type(&ty).is_none());
    }

    #[test]
    fn test_parse_struct() {
        let input: DeriveInput = syn::parse_quote! {
            #[model(prefix = "apply")]
            struct Scale {
                base: ModelBase,
                #[property]
                weight: Property<f64>,
                #[property(name = "Unit")]
                unit_label: Property<String>,
                #[property(read_only)]
                serial: Property<u32>,
                #[property(skip)]
                cache: Property<u8>,
                plain: u8,
            }
        };

        let tokens = impl_derive_model(&input).unwrap().to_string();
        assert!(tokens.contains("\"applyWeight\""));
        assert!(tokens.contains("\"applyUnit\""));
        assert!(!tokens.contains("\"applySerial\""));
        assert!(!tokens.contains("\"applyCache\""));
        assert!(!tokens.contains("\"applyPlain\""));
        assert!(tokens.contains("fn set_weight"));
        assert!(tokens.contains("fn set_unit_label"));
        assert!(!tokens.contains("fn set_serial"));
    }

    #[test]
    fn test_missing_base_is_rejected() {
        let input: DeriveInput = syn::parse_quote! {
            struct NoBase {
                #[property]
                weight: Property<f64>,
            }
        };
        let err = impl_derive_model(&input).unwrap_err();
        assert!(err.to_string().contains("base"));
    }

    #[test]
    fn test_non_property_type_is_rejected() {
        let input: DeriveInput = syn::parse_quote! {
            struct Bad {
                base: ModelBase,
                #[property]
                weight: f64,
            }
        };
        assert!(impl_derive_model(&input).is_err());
    }

    #[test]
    fn test_duplicate_operation_is_rejected() {
        let input: DeriveInput = syn::parse_quote! {
            struct Dup {
                base: ModelBase,
                #[property]
                weight: Property<f64>,
                #[property(name = "Weight")]
                other: Property<f64>,
            }
        };
        let err = impl_derive_model(&input).unwrap_err();
        assert!(err.to_string().contains("setWeight"));
    }

    #[test]
    fn test_unknown_attribute_is_rejected() {
        let input: DeriveInput = syn::parse_quote! {
            struct Unknown {
                base: ModelBase,
                #[property(notify = "x")]
                weight: Property<f64>,
            }
        };
        assert!(impl_derive_model(&input).is_err());
    }
}
