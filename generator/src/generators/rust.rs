use std::collections::BTreeSet;

use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};
use syn::{parse_quote, ImplItemFn, Item, Type};
use wsdlgen_wsdl::ServiceDescription;
use wsdlgen_xsd::{Occurrence, QName, SimpleDerivation, SimpleType, TypeNode};

use super::common::{occurs, GeneratorContext};
use crate::{
    binding::{BindingField, BindingPlan},
    naming::{name_to_ident, shouty_name, snake_name, string_variant_to_ident, NameSet},
    Config,
};

#[derive(Default)]
struct RustVisitor {
    output_items: Vec<Item>,
    wrappers: BTreeSet<String>,
}

/// `meta::Name` expression for an element name.
fn name_expr(name: &QName) -> TokenStream {
    let local = &name.local_name;
    match name.namespace() {
        Some(namespace) => quote!(meta::Name::new(Some(#namespace), #local)),
        None => quote!(meta::Name::new(None, #local)),
    }
}

impl RustVisitor {
    fn visit_complex_type(&mut self, ctx: &GeneratorContext, name: &QName, ident: &str) {
        let ident = name_to_ident(ident);
        let mut names = NameSet::default();
        let mut fields: Vec<TokenStream> = vec![];
        let mut writes: Vec<TokenStream> = vec![];
        let mut reads: Vec<TokenStream> = vec![];

        let init = match ctx.simple_content(name) {
            Some(value) => {
                names.reserve("value");
                let ty = ctx.rust_type(&value).to_type();
                fields.push(quote!(pub value: #ty));
                reads.push(quote!(value: meta::XmlType::from_content(content)?));
                quote!(let mut content = meta::XmlType::to_content(&self.value);)
            }
            None => quote!(let mut content = meta::Content::default();),
        };
        for element in ctx.content_elements(name).unwrap_or_default() {
            let field = snake_name(&element.name.local_name).unwrap_or_else(|| "field".into());
            let field = name_to_ident(&names.unique(&field, "_"));
            let mut ty = ctx.rust_type(&element.type_).to_type();
            if element.occurrence != Occurrence::Repeated && ctx.reaches(&element.type_, name) {
                ty = parse_quote!(Box<#ty>);
            }
            let ty = occurs(ty, element.occurrence);
            fields.push(quote!(pub #field: #ty));

            let xml = name_expr(&element.name);
            let local = &element.name.local_name;
            match element.occurrence {
                Occurrence::Required => {
                    writes.push(quote!(content.push(#xml, &self.#field);));
                    reads.push(quote!(#field: content.required(#local)?));
                }
                Occurrence::Optional => {
                    writes.push(quote! {
                        if let Some(value) = &self.#field {
                            content.push(#xml, value);
                        }
                    });
                    reads.push(quote!(#field: content.optional(#local)?));
                }
                Occurrence::Repeated => {
                    writes.push(quote! {
                        for value in &self.#field {
                            content.push(#xml, value);
                        }
                    });
                    reads.push(quote!(#field: content.repeated(#local)?));
                }
            }
        }
        for attribute in ctx.content_attributes(name) {
            let mut field = snake_name(&attribute.name.local_name).unwrap_or_else(|| "attr".into());
            if names.contains(&field) {
                field.push_str("_attr");
            }
            let field = name_to_ident(&names.unique(&field, "_"));
            let ty = ctx.rust_type(&attribute.type_).to_type();
            let local = &attribute.name.local_name;
            let ty: Type = if attribute.required {
                writes.push(quote!(content.set_attribute(#local, &self.#field);));
                reads.push(quote!(#field: content.required_attribute(#local)?));
                ty
            } else {
                writes.push(quote! {
                    if let Some(value) = &self.#field {
                        content.set_attribute(#local, value);
                    }
                });
                reads.push(quote!(#field: content.optional_attribute(#local)?));
                parse_quote!(Option<#ty>)
            };
            fields.push(quote!(pub #field: #ty));
        }

        let doc = format!(" `{name}`");
        self.output_items.push(parse_quote! {
            #[doc = #doc]
            #[derive(Clone, Debug, PartialEq)]
            pub struct #ident {
                #(#fields),*
            }
        });
        self.output_items.push(parse_quote! {
            impl meta::XmlType for #ident {
                fn to_content(&self) -> meta::Content {
                    #init
                    #(#writes)*
                    content
                }

                fn from_content(content: &meta::Content) -> Result<Self, meta::Error> {
                    Ok(Self { #(#reads),* })
                }
            }
        });
    }

    fn visit_simple_type(
        &mut self,
        ctx: &GeneratorContext,
        name: &QName,
        ident: &str,
        simple_type: &SimpleType,
    ) {
        let ident = name_to_ident(ident);
        let doc = format!(" `{name}`");

        let values: Vec<&str> = simple_type.enumeration().collect();
        let is_text = simple_type.base_kind == wsdlgen_xsd::BuiltinKind::Text;
        if is_text && !values.is_empty() {
            let mut names = NameSet::default();
            let variants: Vec<_> = values
                .iter()
                .map(|value| {
                    let variant = string_variant_to_ident(value).to_string();
                    name_to_ident(&names.unique(&variant, ""))
                })
                .collect();
            let docs = values
                .iter()
                .map(|value| format!("Enumeration value for `` {value} ``"));

            self.output_items.push(parse_quote! {
                #[doc = #doc]
                #[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
                pub enum #ident {
                    #(
                        #[doc = #docs]
                        #variants
                    ),*
                }
            });
            let type_name = name.local_name.as_str();
            self.output_items.push(parse_quote! {
                impl #ident {
                    pub fn as_str(self) -> &'static str {
                        match self {
                            #(Self::#variants => #values),*
                        }
                    }
                }
            });
            self.output_items.push(parse_quote! {
                impl meta::XmlType for #ident {
                    fn to_content(&self) -> meta::Content {
                        meta::Content::from_text(self.as_str())
                    }

                    fn from_content(content: &meta::Content) -> Result<Self, meta::Error> {
                        match content.text.trim() {
                            #(#values => Ok(Self::#variants),)*
                            other => Err(meta::Error::InvalidLiteral {
                                type_name: #type_name,
                                literal: other.to_string(),
                            }),
                        }
                    }
                }
            });
            return;
        }

        let (inner, to_content, from_content): (Type, TokenStream, TokenStream) =
            match &simple_type.derivation {
                SimpleDerivation::List(item) => {
                    let item = ctx.rust_type(item).to_type();
                    (
                        parse_quote!(Vec<#item>),
                        quote!(meta::list_to_content(&self.0)),
                        quote!(meta::list_from_content(content)),
                    )
                }
                derivation => {
                    let inner = match derivation {
                        SimpleDerivation::Restriction(base) => ctx.rust_type(base).to_type(),
                        _ => parse_quote!(String),
                    };
                    (
                        inner,
                        quote!(meta::XmlType::to_content(&self.0)),
                        quote!(meta::XmlType::from_content(content)),
                    )
                }
            };
        self.output_items.push(parse_quote! {
            #[doc = #doc]
            #[derive(Clone, Debug, PartialEq)]
            pub struct #ident(pub #inner);
        });
        self.output_items.push(parse_quote! {
            impl meta::XmlType for #ident {
                fn to_content(&self) -> meta::Content {
                    #to_content
                }

                fn from_content(content: &meta::Content) -> Result<Self, meta::Error> {
                    #from_content.map(Self)
                }
            }
        });
    }

    fn visit_wrapper(&mut self, wrapper: &str, fields: &[BindingField]) {
        if !self.wrappers.insert(wrapper.to_string()) {
            return;
        }
        let ident = name_to_ident(wrapper);
        let fields = fields.iter().map(|field| {
            let name = name_to_ident(&field.ident);
            let ty = field.exposed_type();
            quote!(pub #name: #ty)
        });
        self.output_items.push(parse_quote! {
            #[derive(Clone, Debug, PartialEq)]
            pub struct #ident {
                #(#fields),*
            }
        });
    }

    fn visit_plan(&mut self, plan: &BindingPlan) -> ImplItemFn {
        if let Some(wrapper) = &plan.input_wrapper {
            self.visit_wrapper(wrapper, &plan.inputs);
        }
        if let Some(wrapper) = &plan.output_wrapper {
            self.visit_wrapper(wrapper, &plan.outputs);
        }

        let method = name_to_ident(&plan.method);
        let action = &plan.action;
        let input_idents: Vec<_> = plan.inputs.iter().map(|f| name_to_ident(&f.ident)).collect();
        let output_idents: Vec<_> = plan.outputs.iter().map(|f| name_to_ident(&f.ident)).collect();

        let (params, unpack) = match &plan.input_wrapper {
            Some(wrapper) => {
                let wrapper = name_to_ident(wrapper);
                (
                    vec![quote!(input: #wrapper)],
                    quote!(let #wrapper { #(#input_idents),* } = input;),
                )
            }
            None => (
                plan.inputs
                    .iter()
                    .zip(&input_idents)
                    .map(|(field, ident)| {
                        let ty = field.exposed_type();
                        quote!(#ident: #ty)
                    })
                    .collect(),
                quote!(),
            ),
        };

        let conversions = plan
            .inputs
            .iter()
            .zip(&input_idents)
            .filter(|(field, _)| field.needs_conversion())
            .map(|(field, ident)| {
                let internal = field.internal_type();
                let exposed = field.exposed_type();
                quote! {
                    let #ident = <#internal as wsdlgen_runtime::Representation<#exposed>>::from_exposed(#ident);
                }
            });
        let request_fields = plan.inputs.iter().zip(&input_idents).map(|(field, ident)| {
            let name = name_expr(&field.xml_name);
            match field.occurrence {
                Occurrence::Required => quote!(meta::Field::one(#name, &#ident)),
                Occurrence::Optional => quote!(meta::Field::optional(#name, &#ident)),
                Occurrence::Repeated => quote!(meta::Field::repeated(#name, &#ident)),
            }
        });

        let slots: Vec<_> = (0..plan.outputs.len())
            .map(|i| format_ident!("__out_{}", i))
            .collect();
        let slot_decls = plan.outputs.iter().zip(&slots).map(|(field, slot)| {
            let ty = field.internal.to_type();
            match field.occurrence {
                Occurrence::Repeated => quote!(let mut #slot: Vec<#ty> = Vec::new();),
                Occurrence::Required | Occurrence::Optional => {
                    quote!(let mut #slot: Option<#ty> = None;)
                }
            }
        });
        let response_fields = plan.outputs.iter().zip(&slots).map(|(field, slot)| {
            let name = name_expr(&field.xml_name);
            quote!(meta::FieldMut::new(#name, &mut #slot))
        });

        let extractions = plan
            .outputs
            .iter()
            .zip(&slots)
            .zip(&output_idents)
            .map(|((field, slot), ident)| {
                let extract = match field.occurrence {
                    Occurrence::Required => {
                        let missing = field.xml_name.to_string();
                        quote! {
                            let #ident = #slot.ok_or_else(|| meta::Error::MissingField(#missing.to_string()))?;
                        }
                    }
                    Occurrence::Optional | Occurrence::Repeated => quote!(let #ident = #slot;),
                };
                let convert = field.needs_conversion().then(|| {
                    let internal = field.internal_type();
                    let exposed = field.exposed_type();
                    quote! {
                        let #ident = <#internal as wsdlgen_runtime::Representation<#exposed>>::into_exposed(#ident);
                    }
                });
                quote!(#extract #convert)
            });

        let (result_type, result): (Type, TokenStream) = match (&plan.output_wrapper, plan.outputs.as_slice()) {
            (Some(wrapper), _) => {
                let wrapper = name_to_ident(wrapper);
                (parse_quote!(#wrapper), quote!(#wrapper { #(#output_idents),* }))
            }
            (None, []) => (parse_quote!(()), quote!(())),
            (None, [field]) => {
                let ident = &output_idents[0];
                (field.exposed_type(), quote!(#ident))
            }
            (None, fields) => {
                let types = fields.iter().map(BindingField::exposed_type);
                (parse_quote!((#(#types),*)), quote!((#(#output_idents),*)))
            }
        };

        let element = |name: &Option<QName>| match name {
            Some(name) => {
                let name = name_expr(name);
                quote!(Some(#name))
            }
            None => quote!(None),
        };
        let input_element = element(&plan.input_element);
        let output_element = element(&plan.output_element);
        let input_count = Literal::usize_unsuffixed(plan.inputs.len());
        let output_count = Literal::usize_unsuffixed(plan.outputs.len());
        let docs = plan.documentation.iter().map(|doc| format!(" {doc}"));

        parse_quote! {
            #(#[doc = #docs])*
            pub fn #method(&self, ctx: &meta::Context #(, #params)*) -> Result<#result_type, meta::Error> {
                #unpack
                #(#conversions)*
                #(#slot_decls)*
                {
                    let __request: [meta::Field<'_>; #input_count] = [#(#request_fields),*];
                    let mut __response: [meta::FieldMut<'_>; #output_count] = [#(#response_fields),*];
                    self.invoker.invoke(
                        ctx,
                        #action,
                        meta::Request { element: #input_element, fields: &__request },
                        meta::Response { element: #output_element, fields: &mut __response },
                    )?;
                }
                #(#extractions)*
                Ok(#result)
            }
        }
    }

    fn visit_ports(&mut self, description: &ServiceDescription) {
        let mut names = NameSet::default();
        for port in &description.ports {
            let Some(name) = shouty_name(&port.name) else {
                continue;
            };
            let name = name_to_ident(&names.unique(&format!("{name}_ADDRESS"), "_"));
            let address = &port.address;
            let doc = format!(" Endpoint of port `{}` ({})", port.name, port.method);
            self.output_items.push(parse_quote! {
                #[doc = #doc]
                pub const #name: &str = #address;
            });
        }
    }
}

pub fn generate(
    config: &Config,
    description: &ServiceDescription,
    ctx: &GeneratorContext,
    plans: &[BindingPlan],
) -> String {
    let mut visitor = RustVisitor::default();

    visitor.output_items.push(Item::Use(parse_quote!(
        use wsdlgen_runtime::meta;
    )));
    visitor.visit_ports(description);

    for (name, ident, node) in ctx.emitted() {
        match node {
            TypeNode::Complex(_) => visitor.visit_complex_type(ctx, name, ident),
            TypeNode::Simple(simple_type) => {
                visitor.visit_simple_type(ctx, name, ident, simple_type)
            }
            TypeNode::Builtin(_) => {}
        }
    }

    let methods: Vec<ImplItemFn> = plans.iter().map(|plan| visitor.visit_plan(plan)).collect();
    visitor.output_items.push(parse_quote! {
        /// Calls the operations of the service through an invoker.
        pub struct Client<I> {
            pub invoker: I,
        }
    });
    visitor.output_items.push(parse_quote! {
        impl<I: meta::Invoker> Client<I> {
            pub fn new(invoker: I) -> Self {
                Self { invoker }
            }

            #(#methods)*
        }
    });

    let mut doc_lines = vec![config.header_text()];
    if let Some(documentation) = &description.documentation {
        doc_lines.push(String::new());
        doc_lines.extend(documentation.lines().map(|line| line.trim().to_string()));
    }
    doc_lines.push(String::new());
    doc_lines.push(concat!(
        "Generated by ",
        env!("CARGO_PKG_NAME"),
        " ",
        env!("CARGO_PKG_VERSION")
    )
    .to_string());

    let mut attrs: Vec<syn::Attribute> = doc_lines
        .iter()
        .map(|line| {
            let line = if line.is_empty() {
                String::new()
            } else {
                format!(" {line}")
            };
            parse_quote!(#![doc = #line])
        })
        .collect();
    attrs.push(parse_quote!(#![allow(dead_code, unused_imports, unused_mut)]));

    let root = syn::File {
        shebang: None,
        attrs,
        items: visitor.output_items,
    };
    prettyplease::unparse(&root)
}
