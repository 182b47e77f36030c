//! Binding plans: the calling convention of each generated client method.

use std::collections::BTreeMap;

use heck::ToPascalCase;
use syn::Type;
use tracing::debug;
use wsdlgen_wsdl::{Message, Operation, Port, ServiceDescription};
use wsdlgen_xsd::{Occurrence, QName};

use crate::{
    error::GenerationError,
    generators::common::{occurs, GeneratorContext, RustType},
    naming::{pascal_name, snake_name, NameSet},
    unify::resolve_part,
    Config,
};

/// One argument or result of a client method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingField {
    /// Element carrying the value on the wire
    pub xml_name: QName,
    /// Parameter, local or wrapper field name
    pub ident: String,
    pub type_name: QName,
    /// Type handed to the invoker
    pub internal: RustType,
    /// Type in the method signature
    pub exposed: RustType,
    pub occurrence: Occurrence,
}

impl BindingField {
    pub fn needs_conversion(&self) -> bool {
        self.internal != self.exposed
    }

    pub fn internal_type(&self) -> Type {
        occurs(self.internal.to_type(), self.occurrence)
    }

    pub fn exposed_type(&self) -> Type {
        occurs(self.exposed.to_type(), self.occurrence)
    }
}

/// How one operation is presented to callers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingPlan {
    pub port: String,
    pub operation: String,
    /// Name of the client method
    pub method: String,
    pub action: String,
    pub documentation: Option<String>,
    /// Body element wrapping the inputs, for document-style messages
    pub input_element: Option<QName>,
    pub output_element: Option<QName>,
    pub inputs: Vec<BindingField>,
    pub outputs: Vec<BindingField>,
    /// Struct taking the place of the individual inputs
    pub input_wrapper: Option<String>,
    /// Struct returned in place of the individual outputs
    pub output_wrapper: Option<String>,
}

pub(crate) struct Planner<'p, 'g> {
    context: &'p mut GeneratorContext<'g>,
    config: &'p Config,
    methods: NameSet,
    /// Wrapper struct of each message that needed one
    wrappers: BTreeMap<QName, String>,
}

impl<'p, 'g> Planner<'p, 'g> {
    pub(crate) fn new(context: &'p mut GeneratorContext<'g>, config: &'p Config) -> Self {
        let mut methods = NameSet::default();
        methods.reserve("new");
        Self {
            context,
            config,
            methods,
            wrappers: BTreeMap::new(),
        }
    }

    pub(crate) fn plan(
        &mut self,
        description: &ServiceDescription,
        port: &Port,
        operation: &Operation,
    ) -> Result<BindingPlan, GenerationError> {
        let message = |name: &QName| {
            description
                .message(name)
                .map_err(|source| GenerationError::Wsdl {
                    operation: operation.name.clone(),
                    source,
                })
        };
        let input = message(&operation.input)?;
        let output = message(&operation.output)?;
        let method = snake_name(&operation.name).ok_or_else(|| invalid(operation, &operation.name))?;

        let (input_element, mut inputs) = self.message_fields(operation, input)?;
        let (output_element, mut outputs) = self.message_fields(operation, output)?;

        let input_wrapper = if inputs.len() > self.config.input_threshold() {
            Some(self.wrapper(operation, input)?)
        } else {
            None
        };
        let output_wrapper = if outputs.len() > self.config.output_threshold() {
            Some(self.wrapper(operation, output)?)
        } else {
            None
        };
        disambiguate(&mut inputs, input_wrapper.as_deref(), &["ctx"]);
        disambiguate(&mut outputs, output_wrapper.as_deref(), &[]);

        Ok(BindingPlan {
            port: port.name.clone(),
            operation: operation.name.clone(),
            method: self.methods.unique(&method, "_"),
            action: operation.action.clone(),
            documentation: operation.documentation.clone(),
            input_element,
            output_element,
            inputs,
            outputs,
            input_wrapper,
            output_wrapper,
        })
    }

    /// The body element and the fields of a message.
    ///
    /// A message with a single part of a complex type is the body element, and the children of
    /// that type are the fields. Otherwise every part is a field of its own.
    fn message_fields(
        &self,
        operation: &Operation,
        message: &Message,
    ) -> Result<(Option<QName>, Vec<BindingField>), GenerationError> {
        let graph = self.context.graph;
        let resolved = message
            .parts
            .iter()
            .map(|part| {
                let type_ = resolve_part(graph, part).ok_or_else(|| {
                    GenerationError::UnresolvedPart {
                        operation: operation.name.clone(),
                        message: message.name.clone(),
                        part: part.name.clone(),
                    }
                })?;
                let xml_name = part
                    .element
                    .clone()
                    .unwrap_or_else(|| message.name.sibling(part.name.as_str()));
                Ok((xml_name, type_))
            })
            .collect::<Result<Vec<_>, GenerationError>>()?;

        if let [(element, type_)] = resolved.as_slice() {
            if let Some(children) = self.context.content_elements(type_) {
                let fields = children
                    .iter()
                    .map(|child| self.field(operation, &child.name, &child.type_, child.occurrence))
                    .collect::<Result<_, _>>()?;
                return Ok((Some(element.clone()), fields));
            }
        }

        let fields = resolved
            .iter()
            .map(|(xml_name, type_)| self.field(operation, xml_name, type_, Occurrence::Required))
            .collect::<Result<_, _>>()?;
        Ok((None, fields))
    }

    fn field(
        &self,
        operation: &Operation,
        xml_name: &QName,
        type_: &QName,
        occurrence: Occurrence,
    ) -> Result<BindingField, GenerationError> {
        if !self.context.graph.contains(type_) {
            return Err(GenerationError::Internal {
                operation: operation.name.clone(),
                message: format!("type {type_} of {xml_name} is not in the type graph"),
            });
        }
        let ident =
            snake_name(&xml_name.local_name).ok_or_else(|| invalid(operation, &xml_name.local_name))?;
        Ok(BindingField {
            xml_name: xml_name.clone(),
            ident,
            type_name: type_.clone(),
            internal: self.context.rust_type(type_),
            exposed: self.context.exposed_type(type_),
            occurrence,
        })
    }

    /// The wrapper struct of `message`. Operations sharing a message share its wrapper.
    fn wrapper(&mut self, operation: &Operation, message: &Message) -> Result<String, GenerationError> {
        if let Some(name) = self.wrappers.get(&message.name) {
            return Ok(name.clone());
        }
        let base = pascal_name(&message.name.local_name)
            .ok_or_else(|| invalid(operation, &message.name.local_name))?;
        let name = self.context.unique_type_name(&base);
        debug!(message = %message.name, wrapper = %name, "synthesized wrapper");
        self.wrappers.insert(message.name.clone(), name.clone());
        Ok(name)
    }
}

fn invalid(operation: &Operation, name: &str) -> GenerationError {
    GenerationError::InvalidIdentifier {
        operation: operation.name.clone(),
        name: name.into(),
    }
}

/// Makes the field names of one list unique, keeping their order.
fn disambiguate(fields: &mut [BindingField], wrapper: Option<&str>, reserved: &[&str]) {
    let mut names = NameSet::default();
    for name in reserved {
        names.reserve(*name);
    }
    for field in fields {
        let mut ident = std::mem::take(&mut field.ident);
        if wrapper.is_some_and(|wrapper| ident.to_pascal_case() == wrapper) {
            ident.push('_');
        }
        field.ident = names.unique(&ident, "_");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;

    const RPC: &str = r#"<?xml version="1.0"?>
        <definitions xmlns="http://schemas.xmlsoap.org/wsdl/"
                     xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
                     xmlns:xs="http://www.w3.org/2001/XMLSchema"
                     xmlns:tns="urn:spell"
                     targetNamespace="urn:spell">
          <message name="SuggestRequest">
            <part name="name" type="xs:string"/>
            <part name="src" type="xs:string"/>
          </message>
          <message name="SuggestResponse">
            <part name="return" type="xs:string"/>
          </message>
          <portType name="SpellPortType">
            <operation name="Suggest">
              <documentation>Suggests a spelling</documentation>
              <input message="tns:SuggestRequest"/>
              <output message="tns:SuggestResponse"/>
            </operation>
          </portType>
          <binding name="SpellBinding" type="tns:SpellPortType">
            <soap:binding style="rpc" transport="http://schemas.xmlsoap.org/soap/http"/>
            <operation name="Suggest">
              <soap:operation soapAction="urn:spell#Suggest"/>
            </operation>
          </binding>
          <service name="Spell">
            <port name="SpellPort" binding="tns:SpellBinding">
              <soap:address location="http://example.com/spell"/>
            </port>
          </service>
        </definitions>"#;

    fn spell(local: &str) -> QName {
        QName::with_namespace("urn:spell", local)
    }

    fn plans(text: &str, config: &Config) -> Vec<BindingPlan> {
        let doc = roxmltree::Document::parse(text).unwrap();
        let generated = compile(config, std::slice::from_ref(&doc)).unwrap();
        assert!(generated.failures.is_empty(), "{:?}", generated.failures);
        generated.plans
    }

    /// An RPC service whose input message has `count` string parts.
    fn with_inputs(count: usize) -> String {
        let parts: String = (0..count)
            .map(|i| format!(r#"<part name="arg{i}" type="xs:string"/>"#))
            .collect();
        RPC.replace(
            r#"<part name="name" type="xs:string"/>
            <part name="src" type="xs:string"/>"#,
            &parts,
        )
    }

    #[test]
    fn rpc_parts_become_arguments() {
        let plans = plans(RPC, &Config::default());
        assert_eq!(plans.len(), 1);
        let plan = &plans[0];

        assert_eq!(plan.method, "suggest");
        assert_eq!(plan.action, "urn:spell#Suggest");
        assert_eq!(plan.documentation.as_deref(), Some("Suggests a spelling"));
        assert_eq!(plan.input_element, Some(spell("SuggestRequest")));
        assert_eq!(plan.output_element, Some(spell("SuggestResponse")));

        let inputs: Vec<_> = plan
            .inputs
            .iter()
            .map(|f| (f.ident.as_str(), f.xml_name.clone(), f.exposed.to_string()))
            .collect();
        assert_eq!(
            inputs,
            vec![
                ("name", spell("name"), "String".to_string()),
                ("src", spell("src"), "String".to_string()),
            ]
        );
        assert_eq!(plan.outputs.len(), 1);
        assert_eq!(plan.outputs[0].ident, "return");
        assert_eq!(plan.input_wrapper, None);
        assert_eq!(plan.output_wrapper, None);
    }

    #[test]
    fn wrapper_starts_above_the_threshold() {
        let at = plans(&with_inputs(3), &Config::default().max_input_args(3));
        assert_eq!(at[0].inputs.len(), 3);
        assert_eq!(at[0].input_wrapper, None);

        let above = plans(&with_inputs(4), &Config::default().max_input_args(3));
        assert_eq!(above[0].input_wrapper.as_deref(), Some("SuggestRequest"));
        let idents: Vec<_> = above[0].inputs.iter().map(|f| f.ident.as_str()).collect();
        assert_eq!(idents, vec!["arg0", "arg1", "arg2", "arg3"]);
    }

    #[test]
    fn many_outputs_share_one_wrapper() {
        let parts: String = (0..58)
            .map(|i| format!(r#"<part name="out{i}" type="xs:int"/>"#))
            .collect();
        let text = RPC.replace(r#"<part name="return" type="xs:string"/>"#, &parts);
        let plans = plans(&text, &Config::default().max_output_args(1));

        let plan = &plans[0];
        assert_eq!(plan.output_wrapper.as_deref(), Some("SuggestResponse"));
        assert_eq!(plan.outputs.len(), 58);
        assert!(plan
            .outputs
            .iter()
            .enumerate()
            .all(|(i, f)| f.ident == format!("out{i}") && f.exposed == RustType::Primitive("i32")));
    }

    #[test]
    fn binary_is_exposed_as_bytes() {
        let text = RPC.replace(
            r#"<part name="src" type="xs:string"/>"#,
            r#"<part name="src" type="xs:base64Binary"/>"#,
        );
        let plans = plans(&text, &Config::default());
        let src = &plans[0].inputs[1];
        assert_eq!(src.internal, RustType::Helper("Base64Binary"));
        assert_eq!(src.exposed, RustType::Bytes);
        assert!(src.needs_conversion());
        assert!(!plans[0].inputs[0].needs_conversion());
    }

    #[test]
    fn soap_encoded_parts_use_their_builtin_base() {
        let text = RPC
            .replace(
                r#"xmlns:tns="urn:spell""#,
                r#"xmlns:tns="urn:spell" xmlns:soapenc="http://schemas.xmlsoap.org/soap/encoding/""#,
            )
            .replace(
                r#"<part name="name" type="xs:string"/>"#,
                r#"<part name="name" type="soapenc:string"/>"#,
            )
            .replace(
                r#"<part name="src" type="xs:string"/>"#,
                r#"<part name="src" type="soapenc:base64"/>"#,
            );
        let encoded = plans(&text, &Config::default());
        let name = &encoded[0].inputs[0];
        assert_eq!(name.type_name.local_name, "string");
        assert_eq!(name.internal, RustType::Primitive("String"));
        assert_eq!(name.exposed, RustType::Primitive("String"));
        let src = &encoded[0].inputs[1];
        assert_eq!(src.internal, RustType::Helper("Base64Binary"));
        assert_eq!(src.exposed, RustType::Bytes);
    }

    #[test]
    fn colliding_names_are_disambiguated() {
        let text = RPC
            .replace(r#"name="name""#, r#"name="user-name""#)
            .replace(r#"name="src""#, r#"name="userName""#);
        let renamed = plans(&text, &Config::default());
        let idents: Vec<_> = renamed[0].inputs.iter().map(|f| f.ident.as_str()).collect();
        assert_eq!(idents, vec!["user_name", "user_name_2"]);

        let text = RPC.replace(r#"name="src""#, r#"name="ctx""#);
        let reserved = plans(&text, &Config::default());
        assert_eq!(reserved[0].inputs[1].ident, "ctx_2");
    }

    #[test]
    fn fields_named_like_their_wrapper_get_a_suffix() {
        let text = RPC.replace(r#"name="name""#, r#"name="suggestRequest""#);
        let wrapped = plans(&text, &Config::default().max_input_args(1));
        assert_eq!(wrapped[0].input_wrapper.as_deref(), Some("SuggestRequest"));
        let idents: Vec<_> = wrapped[0].inputs.iter().map(|f| f.ident.as_str()).collect();
        assert_eq!(idents, vec!["suggest_request_", "src"]);

        let unwrapped = plans(&text, &Config::default());
        assert_eq!(unwrapped[0].input_wrapper, None);
        assert_eq!(unwrapped[0].inputs[0].ident, "suggest_request");
    }

    #[test]
    fn document_style_fields_come_from_the_element() {
        let text = RPC
            .replace(
                "<message name=\"SuggestRequest\">",
                r#"<types>
                     <xs:schema targetNamespace="urn:spell" elementFormDefault="qualified">
                       <xs:element name="Suggest">
                         <xs:complexType>
                           <xs:sequence>
                             <xs:element name="word" type="xs:string"/>
                             <xs:element name="limit" type="xs:int" minOccurs="0"/>
                             <xs:element name="lang" type="xs:language" maxOccurs="unbounded"/>
                           </xs:sequence>
                         </xs:complexType>
                       </xs:element>
                     </xs:schema>
                   </types>
                   <message name="SuggestRequest">"#,
            )
            .replace(
                r#"<part name="name" type="xs:string"/>
            <part name="src" type="xs:string"/>"#,
                r#"<part name="parameters" element="tns:Suggest"/>"#,
            )
            .replace(r#"style="rpc""#, r#"style="document""#);
        let plans = plans(&text, &Config::default());
        let plan = &plans[0];

        assert_eq!(plan.input_element, Some(spell("Suggest")));
        let inputs: Vec<_> = plan
            .inputs
            .iter()
            .map(|f| (f.ident.as_str(), f.occurrence))
            .collect();
        assert_eq!(
            inputs,
            vec![
                ("word", Occurrence::Required),
                ("limit", Occurrence::Optional),
                ("lang", Occurrence::Repeated),
            ]
        );
        // a bare builtin part is a field of its own
        assert_eq!(plan.output_element, None);
        assert_eq!(plan.outputs[0].xml_name, spell("return"));
    }
}
