use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::{format_ident, quote, quote_spanned};
use syn::spanned::Spanned;
use syn::{Attribute, Fields, GenericArgument, ItemStruct, Lit, PathArguments, Type, parse_macro_input};

/// Options parsed from `#[property(...)]` on a single field
#[derive(Default)]
struct PropertyOptions {
    ignore: bool,
    archive: bool,
    key: Option<String>,
}

/// Parse every `#[property(...)]` attribute on a field
fn parse_property_options(attrs: &[Attribute]) -> syn::Result<PropertyOptions> {
    let mut options = PropertyOptions::default();

    for attr in attrs {
        if !attr.path().is_ident("property") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("ignore") {
                options.ignore = true;
            } else if meta.path.is_ident("archive") {
                options.archive = true;
            } else if meta.path.is_ident("key") {
                meta.input.parse::<syn::Token![=]>()?;
                let lit: Lit = meta.input.parse()?;
                match lit {
                    Lit::Str(s) if !s.value().is_empty() => options.key = Some(s.value()),
                    other => return Err(syn::Error::new(other.span(), "expected a non-empty string")),
                }
            } else {
                return Err(meta.error("unsupported property option, expected `ignore`, `archive` or `key = \"...\"`"));
            }
            Ok(())
        })?;
    }

    if options.ignore && (options.archive || options.key.is_some()) {
        return Err(syn::Error::new(
            Span::call_site(),
            "`ignore` cannot be combined with other property options",
        ));
    }

    Ok(options)
}

/// If `ty` is `Option<T>`, return `T`
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    if path.qself.is_some() {
        return None;
    }
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first() {
        Some(GenericArgument::Type(inner)) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}

/// A field that is routed through the accessor
struct RoutedField<'a> {
    ident: &'a syn::Ident,
    vis: &'a syn::Visibility,
    ty: &'a Type,
    attrs: Vec<&'a Attribute>,
    key: String,
    archive: bool,
}

impl RoutedField<'_> {
    fn value_type(&self) -> &Type {
        option_inner(self.ty).unwrap_or(self.ty)
    }

    fn is_optional(&self) -> bool {
        option_inner(self.ty).is_some()
    }

    /// The TypeTag expression, spanned so an unsupported type points at the field
    fn tag(&self) -> proc_macro2::TokenStream {
        let value_ty = self.value_type();
        if self.archive {
            quote! { ::property_accessor::TypeTag::ArchivableObject }
        } else {
            quote_spanned! {value_ty.span()=>
                <#value_ty as ::property_accessor::PropertyValue>::TAG
            }
        }
    }

    fn accessors(&self) -> proc_macro2::TokenStream {
        let ident = self.ident;
        let vis = self.vis;
        let ty = self.ty;
        let value_ty = self.value_type();
        let attrs = &self.attrs;
        let key = &self.key;
        let tag = self.tag();
        let setter = format_ident!("set_{}", ident);

        let decode = if self.archive {
            quote! { ::property_accessor::unarchive_object::<#value_ty> }
        } else {
            quote_spanned! {value_ty.span()=>
                <#value_ty as ::property_accessor::PropertyValue>::from_value
            }
        };

        let read = quote! {
            ::property_accessor::PropertyAccessor::read_property(&*self.__backing, #key, #tag)
                .and_then(#decode)
        };

        let getter_body = if self.is_optional() {
            read
        } else {
            quote_spanned! {ty.span()=> #read.unwrap_or_default() }
        };

        let write = |value: proc_macro2::TokenStream| {
            quote! {
                ::property_accessor::PropertyAccessor::write_property(&*self.__backing, #key, #tag, #value)
            }
        };

        let setter_body = match (self.is_optional(), self.archive) {
            (false, false) => {
                let call = write(quote! {
                    Some(<#value_ty as ::property_accessor::PropertyValue>::into_value(value))
                });
                quote! { #call; }
            }
            (true, false) => {
                let call = write(quote! {
                    value.map(<#value_ty as ::property_accessor::PropertyValue>::into_value)
                });
                quote! { #call; }
            }
            (false, true) => {
                let call = write(quote! { Some(archived) });
                quote! {
                    if let Some(archived) = ::property_accessor::archive_object(&value) {
                        #call;
                    }
                }
            }
            (true, true) => {
                let remove = write(quote! { None });
                let call = write(quote! { Some(archived) });
                quote! {
                    match value {
                        None => #remove,
                        Some(value) => {
                            if let Some(archived) = ::property_accessor::archive_object(&value) {
                                #call;
                            }
                        }
                    }
                }
            }
        };

        quote! {
            #(#attrs)*
            #vis fn #ident(&self) -> #ty {
                #getter_body
            }

            #vis fn #setter(&self, value: #ty) {
                #setter_body
            }
        }
    }
}

/// Attribute macro that routes a struct's fields through a `PropertyAccessor`.
///
/// Every named field becomes a getter/setter pair calling
/// `read_property`/`write_property` on the backing store. The fields no
/// longer exist in memory; the struct instead holds the backing handle.
///
/// ## Field classification
///
/// A field's `TypeTag` comes from its `PropertyValue` implementation, so a
/// field of an unsupported type is a compile error. `Option<T>` fields read
/// `None` when unset and accept `None` to remove the attribute. Other fields
/// read `T::default()` when unset.
///
/// ## Options
///
/// - `#[properties(backing = Type)]`: hold `Arc<Type>` instead of
///   `Arc<dyn PropertyAccessor>`
/// - `#[property(ignore)]`: keep the field as an ordinary in-memory field
/// - `#[property(archive)]`: store any `Serialize + DeserializeOwned` type as
///   an archived object
/// - `#[property(key = "name")]`: store under a different attribute name
///
/// Other attributes on the struct are kept on the rewritten struct, which
/// holds only the backing handle and the ignored fields. `#[derive(Debug)]`
/// works because every `PropertyAccessor` is `Debug`; derives that need
/// more from the handle, such as `PartialEq`, do not.
///
/// ## Generated items
///
/// - `new(backing, ignored_fields...)` constructor
/// - `backing()` returning the backing handle
/// - `field()` / `set_field(value)` for each routed field
/// - `impl Properties` with the static descriptor table
///
/// ## Example
///
/// ```text
/// #[properties(backing = FileAttributes)]
/// pub struct ReaderState {
///     pub page: u32,
///     pub last_opened: Option<DateTime<Utc>>,
///     #[property(archive)]
///     pub highlight: Color,
///     #[property(ignore)]
///     pub scratch: String,
/// }
/// // Use: let state = ReaderState::new(FileAttributes::shared(path)?, String::new());
/// ```
#[proc_macro_attribute]
pub fn properties(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut backing: Option<Type> = None;
    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("backing") {
            backing = Some(meta.value()?.parse()?);
            Ok(())
        } else {
            Err(meta.error("unsupported properties option, expected `backing = Type`"))
        }
    });
    parse_macro_input!(args with parser);

    let input = parse_macro_input!(input as ItemStruct);
    match expand(input, backing) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(e) => TokenStream::from(e.to_compile_error()),
    }
}

fn expand(input: ItemStruct, backing: Option<Type>) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let vis = &input.vis;
    let struct_attrs = &input.attrs;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(
            input.generics.span(),
            "#[properties] does not support generic structs",
        ));
    }

    let fields = match &input.fields {
        Fields::Named(fields) => &fields.named,
        _ => {
            return Err(syn::Error::new(
                input.span(),
                "#[properties] only supports structs with named fields",
            ));
        }
    };

    let backing_ty = match &backing {
        Some(ty) => quote! { #ty },
        None => quote! { dyn ::property_accessor::PropertyAccessor },
    };

    let mut routed = Vec::new();
    let mut kept_fields = Vec::new();
    let mut new_params = Vec::new();
    let mut new_field_inits = Vec::new();

    for field in fields.iter() {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let options = parse_property_options(&field.attrs)?;
        let other_attrs: Vec<&Attribute> = field
            .attrs
            .iter()
            .filter(|attr| !attr.path().is_ident("property"))
            .collect();

        if ident == "__backing" {
            return Err(syn::Error::new(ident.span(), "`__backing` is reserved by #[properties]"));
        }

        if options.ignore {
            let field_vis = &field.vis;
            let field_ty = &field.ty;
            kept_fields.push(quote! { #(#other_attrs)* #field_vis #ident: #field_ty });
            new_params.push(quote! { #ident: #field_ty });
            new_field_inits.push(quote! { #ident });
            continue;
        }

        let key = options.key.unwrap_or_else(|| ident.to_string());
        if routed.iter().any(|r: &RoutedField| r.key == key) {
            return Err(syn::Error::new(
                ident.span(),
                format!("duplicate property key `{}`", key),
            ));
        }

        routed.push(RoutedField {
            ident,
            vis: &field.vis,
            ty: &field.ty,
            attrs: other_attrs,
            key,
            archive: options.archive,
        });
    }

    let accessors: Vec<_> = routed.iter().map(|field| field.accessors()).collect();

    let descriptors: Vec<_> = routed
        .iter()
        .map(|field| {
            let field_name = field.ident.to_string();
            let key = &field.key;
            let tag = field.tag();
            quote! {
                ::property_accessor::FieldDescriptor {
                    name: #field_name,
                    key: #key,
                    declared_type: #tag,
                }
            }
        })
        .collect();

    let expanded = quote! {
        #(#struct_attrs)*
        #vis struct #name {
            __backing: ::std::sync::Arc<#backing_ty>,
            #(#kept_fields),*
        }

        impl #name {
            /// Create an instance routed through `backing`.
            ///
            /// Parameters after `backing` initialize the `#[property(ignore)]` fields.
            pub fn new(backing: ::std::sync::Arc<#backing_ty>, #(#new_params),*) -> Self {
                Self {
                    __backing: backing,
                    #(#new_field_inits),*
                }
            }

            /// The store every routed field reads from and writes to.
            pub fn backing(&self) -> &::std::sync::Arc<#backing_ty> {
                &self.__backing
            }

            #(#accessors)*
        }

        impl ::property_accessor::Properties for #name {
            fn properties() -> &'static [::property_accessor::FieldDescriptor] {
                const PROPERTIES: &[::property_accessor::FieldDescriptor] = &[
                    #(#descriptors),*
                ];
                PROPERTIES
            }

            fn accessor(&self) -> &dyn ::property_accessor::PropertyAccessor {
                &*self.__backing
            }
        }
    };

    Ok(expanded)
}
