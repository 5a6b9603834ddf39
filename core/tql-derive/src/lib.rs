//! TQL Derive — procedural macros for the TQL query layer.
//!
//! Provides `#[derive(Record)]`, mapping a named-field struct onto a table
//! tuple `{table, field1, field2, ...}`. The first field is the key.

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, parse_macro_input};

/// Derive macro implementing `tql_core::api::Record`.
///
/// # Example
///
/// ```ignore
/// #[derive(Record)]
/// #[tql(table_name = "person")]
/// pub struct Person {
///     pub id: i64,
///     pub name: String,
///     pub age: i32,
/// }
/// ```
///
/// Generates:
/// - `TABLE_NAME` (defaults to the lowercased struct name)
/// - `ATTRIBUTES` in declaration order
/// - `to_values` / `from_values`
#[proc_macro_derive(Record, attributes(tql))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let table_name = extract_table_name(input).unwrap_or_else(|| name.to_string().to_lowercase());

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) if !fields.named.is_empty() => &fields.named,
            Fields::Named(_) => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Record needs at least one field (the key)",
                ));
            }
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Record can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Record can only be derived for structs",
            ));
        }
    };

    let idents: Vec<_> = fields.iter().filter_map(|f| f.ident.as_ref()).collect();
    let types: Vec<_> = fields.iter().map(|f| &f.ty).collect();
    let attribute_names: Vec<String> = idents.iter().map(|i| i.to_string()).collect();
    let arity = idents.len();

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics tql_core::api::Record for #name #ty_generics #where_clause {
            const TABLE_NAME: &'static str = #table_name;
            const ATTRIBUTES: &'static [&'static str] = &[#(#attribute_names),*];

            fn to_values(&self) -> ::std::vec::Vec<tql_core::Value> {
                ::std::vec![
                    #(tql_core::api::IntoValue::into_value(::std::clone::Clone::clone(&self.#idents))),*
                ]
            }

            fn from_values(
                values: ::std::vec::Vec<tql_core::Value>,
            ) -> tql_core::TqlResult<Self> {
                if values.len() != #arity {
                    return ::std::result::Result::Err(tql_core::TqlError::MalformedTuple {
                        table: #table_name.to_string(),
                        reason: ::std::format!(
                            "expected {} values, got {}",
                            #arity,
                            values.len()
                        ),
                    });
                }
                let mut values = values.into_iter();
                ::std::result::Result::Ok(Self {
                    #(
                        #idents: <#types as tql_core::api::FromValue>::from_value(
                            values.next().unwrap_or(tql_core::Value::Null),
                        )?,
                    )*
                })
            }
        }
    };

    Ok(expanded)
}

fn extract_table_name(input: &DeriveInput) -> Option<String> {
    for attr in &input.attrs {
        if attr.path().is_ident("tql")
            && let Ok(meta) = attr.parse_args::<syn::Meta>()
            && let syn::Meta::NameValue(nv) = meta
            && nv.path.is_ident("table_name")
            && let syn::Expr::Lit(lit) = nv.value
            && let syn::Lit::Str(s) = lit.lit
        {
            return Some(s.value());
        }
    }
    None
}
