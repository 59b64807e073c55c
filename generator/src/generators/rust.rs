use std::collections::BTreeSet;

use check_keyword::CheckKeyword;
use heck::ToSnakeCase;
use quote::format_ident;
use syn::{__private::Span, parse_quote, Expr, FnArg, Ident, ImplItem, Item, ReturnType, Type};

use glbind_registry::mapping::apply;
use glbind_registry::{CommandSignature, EnumConstant, TypeDefinition, TypeDescriptor};

use super::common::{EnumLiteral, GeneratorContext, LiteralType, PackageVisitor};
use super::GenerateError;

/// Function pointers and the thunks that call them live next to the wrapper methods, so the
/// struct fields and the loader statements are kept apart until `finish`.
#[derive(Default)]
pub(super) struct RustVisitor {
    aliases: Vec<Item>,
    alias_names: BTreeSet<String>,
    prototypes: Vec<Item>,
    thunks: Vec<Item>,
    constants: Vec<Item>,
    field_names: Vec<Ident>,
    field_types: Vec<Ident>,
    entry_points: Vec<String>,
    methods: Vec<ImplItem>,
}

impl RustVisitor {
    fn name_to_ident(name: &str) -> Ident {
        if ["crate", "self", "super", "Self"].contains(&name) {
            // These are keywords that are not allowed as raw identifiers
            Ident::new(&format!("{}_", name), Span::call_site())
        } else if name.is_keyword() {
            Ident::new_raw(name, Span::call_site())
        } else {
            Ident::new(name, Span::call_site())
        }
    }

    fn parse_type(spelling: &str) -> Result<Type, GenerateError> {
        Ok(syn::parse_str(spelling)?)
    }

    fn native_type(ctx: &GeneratorContext, type_: &TypeDescriptor) -> Result<Type, GenerateError> {
        Self::parse_type(&ctx.types.render(type_).unwrap_or_default())
    }

    fn foreign_type(ctx: &GeneratorContext, type_: &TypeDescriptor) -> Result<Type, GenerateError> {
        Self::parse_type(&ctx.types.render_foreign(type_).unwrap_or_default())
    }

    /// Picks the method name for `command`, falling back to the declared spelling when the
    /// snake-case form is already taken.
    fn method_ident(&self, command: &CommandSignature) -> Ident {
        let snake = command.name.to_snake_case();
        let taken = self.field_names.iter().any(|ident| ident == snake.as_str());
        Self::name_to_ident(if taken { &command.name } else { &snake })
    }

    /// Spells constants with a registry alias when the package declares one.
    fn constant_type(ctx: &GeneratorContext, literal: &EnumLiteral) -> Ident {
        let declared = |alias: &str| ctx.package.type_definitions.iter().any(|t| t.name == alias);
        let name = match literal.type_ {
            LiteralType::Int32 => "i32",
            LiteralType::Uint64 => "u64",
            LiteralType::Bitmask if declared("GLbitfield") => "GLbitfield",
            LiteralType::Uint32 if declared("GLenum") => "GLenum",
            LiteralType::Bitmask | LiteralType::Uint32 => "u32",
        };
        Ident::new(name, Span::call_site())
    }
}

impl PackageVisitor for RustVisitor {
    fn visit_type_definition(
        &mut self,
        ctx: &mut GeneratorContext,
        type_definition: &TypeDefinition,
    ) -> Result<(), GenerateError> {
        let Some(primitive) = ctx.types.primitive(&type_definition.name) else {
            return Ok(());
        };
        if !self.alias_names.insert(type_definition.name.clone()) {
            return Ok(());
        }
        let name = Ident::new(&type_definition.name, Span::call_site());
        let target = Self::parse_type(primitive.foreign)?;
        let doc = format!(" `{}`", type_definition.source_text.trim());
        self.aliases.push(parse_quote! {
            #[doc = #doc]
            pub type #name = #target;
        });
        Ok(())
    }

    fn visit_enum(
        &mut self,
        ctx: &mut GeneratorContext,
        constant: &EnumConstant,
        literal: EnumLiteral,
    ) -> Result<(), GenerateError> {
        let name = Self::name_to_ident(&constant.name);
        let type_ = Self::constant_type(ctx, &literal);
        let value: Expr = syn::parse_str(&literal.digits)?;
        self.constants.push(parse_quote! {
            pub const #name: #type_ = #value;
        });
        Ok(())
    }

    fn visit_command(
        &mut self,
        ctx: &mut GeneratorContext,
        command: &CommandSignature,
    ) -> Result<(), GenerateError> {
        let method = self.method_ident(command);
        let pfn = format_ident!("PFN{}PROC", command.entry_point.to_uppercase());
        let thunk = format_ident!("invoke_{}", method.to_string().trim_start_matches("r#"));

        let mut foreign_params: Vec<FnArg> = Vec::new();
        let mut native_params: Vec<FnArg> = Vec::new();
        let mut forwarded: Vec<Ident> = Vec::new();
        let mut converted: Vec<String> = Vec::new();
        for parameter in &command.parameters {
            let ident = Self::name_to_ident(&parameter.name.to_snake_case());
            let foreign = Self::foreign_type(ctx, &parameter.type_)?;
            let native = Self::native_type(ctx, &parameter.type_)?;
            foreign_params.push(parse_quote!(#ident: #foreign));
            native_params.push(parse_quote!(#ident: #native));
            let template = ctx
                .types
                .conversion_expression(&parameter.type_)
                .unwrap_or_default();
            converted.push(apply(&template, &ident.to_string()));
            forwarded.push(ident);
        }

        let (foreign_return, native_return, return_template): (ReturnType, ReturnType, String) =
            if command.return_type.is_void() {
                (ReturnType::Default, ReturnType::Default, "{}".into())
            } else {
                let foreign = Self::foreign_type(ctx, &command.return_type)?;
                let native = Self::native_type(ctx, &command.return_type)?;
                let template = ctx
                    .types
                    .return_conversion_expression(&command.return_type)
                    .unwrap_or_default();
                (parse_quote!(-> #foreign), parse_quote!(-> #native), template)
            };

        let c_prototype = format!(
            " `{} {}({})`",
            command.return_type,
            command.entry_point,
            command
                .parameters
                .iter()
                .map(|p| p.type_.declare(&p.name))
                .collect::<Vec<_>>()
                .join(", ")
        );
        self.prototypes.push(parse_quote! {
            #[doc = #c_prototype]
            pub type #pfn = unsafe extern "system" fn(#(#foreign_params),*) #foreign_return;
        });
        self.thunks.push(parse_quote! {
            #[inline]
            unsafe fn #thunk(fptr: #pfn, #(#foreign_params),*) #foreign_return {
                fptr(#(#forwarded),*)
            }
        });

        let call = format!("{thunk}(self.{method}, {})", converted.join(", "));
        let body: Expr = syn::parse_str(&apply(&return_template, &call))?;
        let docs: Vec<String> = ctx
            .doc_lines(command)
            .into_iter()
            .map(|line| format!(" {line}"))
            .collect();
        self.methods.push(parse_quote! {
            #(#[doc = #docs])*
            #[inline]
            pub unsafe fn #method(&self, #(#native_params),*) #native_return {
                #body
            }
        });

        self.field_names.push(method);
        self.field_types.push(pfn);
        self.entry_points.push(command.entry_point.clone());
        Ok(())
    }

    fn finish(self, ctx: &GeneratorContext) -> Result<String, GenerateError> {
        let mut items: Vec<Item> = vec![
            parse_quote!(use std::ffi::c_void;),
            parse_quote!(use std::fmt;),
        ];

        for (os, library) in ctx.linkage().libraries {
            items.push(parse_quote! {
                #[cfg(target_os = #os)]
                pub const LIBRARY_NAME: &str = #library;
            });
        }

        items.push(parse_quote! {
            /// Opaque address handed across the boundary.
            pub type Pointer = *mut c_void;
        });
        items.extend(self.aliases);
        items.extend(self.prototypes);
        items.extend(self.thunks);
        items.extend(self.constants);

        items.push(parse_quote! {
            /// The named entry point could not be resolved.
            #[derive(Clone, Copy, Debug, PartialEq, Eq)]
            pub struct LoadError(pub &'static str);
        });
        items.push(parse_quote! {
            impl fmt::Display for LoadError {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "unable to load {}", self.0)
                }
            }
        });
        items.push(parse_quote! {
            impl std::error::Error for LoadError {}
        });
        items.push(parse_quote! {
            unsafe fn load<T: Copy>(
                get_proc_address: &mut dyn FnMut(&str) -> *const c_void,
                name: &'static str,
            ) -> Result<T, LoadError> {
                let address = get_proc_address(name);
                if address.is_null() {
                    Err(LoadError(name))
                } else {
                    Ok(std::mem::transmute_copy(&address))
                }
            }
        });

        let field_names = &self.field_names;
        let field_types = &self.field_types;
        let entry_points = &self.entry_points;
        let methods = &self.methods;
        items.push(parse_quote! {
            /// Resolved entry points.
            pub struct Gl {
                #(#field_names: #field_types,)*
            }
        });
        items.push(parse_quote! {
            impl Gl {
                /// Resolves every entry point through `get_proc_address`, failing on the first
                /// one it cannot find.
                pub fn load_with<F>(mut get_proc_address: F) -> Result<Self, LoadError>
                where
                    F: FnMut(&str) -> *const c_void,
                {
                    Ok(Self {
                        #(#field_names: unsafe { load(&mut get_proc_address, #entry_points)? },)*
                    })
                }

                #(#methods)*
            }
        });

        let doc_comment = format!(
            "Generated by {} {} for {}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            ctx.title()
        );
        let root = syn::File {
            shebang: None,
            attrs: vec![
                parse_quote!(#![doc = #doc_comment]),
                parse_quote!(#![allow(
                    non_camel_case_types,
                    non_snake_case,
                    non_upper_case_globals,
                    dead_code,
                    unused_mut,
                    unused_variables,
                    clippy::all
                )]),
            ],
            items,
        };
        Ok(prettyplease::unparse(&root))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{package, OPTIONS};
    use super::super::Generator;

    fn generated() -> String {
        Generator::Rust.generate(&package(), OPTIONS).unwrap().value
    }

    #[test]
    fn output_parses_as_rust() {
        syn::parse_file(&generated()).unwrap();
    }

    #[test]
    fn emits_sections_in_order() {
        let text = generated();
        let position = |needle: &str| {
            text.find(needle)
                .unwrap_or_else(|| panic!("missing {needle:?} in\n{text}"))
        };
        let linkage = position("pub const LIBRARY_NAME");
        let alias = position("pub type GLfloat = f32;");
        let prototype = position("pub type PFNGLCLEARPROC");
        let constant = position("pub const COLOR_BUFFER_BIT: GLbitfield = 0x00004000;");
        let wrapper = position("pub unsafe fn clear(");
        assert!(linkage < alias && alias < prototype && prototype < constant && constant < wrapper);
    }

    #[test]
    fn converts_booleans_and_pointers() {
        let text = generated();
        assert!(text.contains("pub type GLboolean = u8;"));
        assert!(text.contains("pub unsafe fn is_enabled(&self, cap: u32) -> bool"));
        assert!(text.contains("invoke_is_enabled(self.is_enabled, cap) != 0"));
        assert!(text.contains("pub unsafe fn map_buffer(&self, target: u32, r#type: u32) -> Pointer"));
        assert!(text.contains("string: *const *const i8"));
    }

    #[test]
    fn constants_keep_width_and_prefix_rules() {
        let text = generated();
        assert!(text.contains("pub const GL_3D: GLenum = 0x806F;"));
        assert!(text.contains("pub const TIMEOUT_IGNORED: u64 = 0xFFFFFFFFFFFFFFFF;"));
        assert!(!text.contains("ALIAS"));
        assert!(!text.contains("debug_message_callback"));
    }

    #[test]
    fn loads_every_entry_point_by_declared_name() {
        let text = generated();
        assert!(text.contains("\"glShaderSource\""));
        assert!(text.contains("pub fn load_with<F>(mut get_proc_address: F) -> Result<Self, LoadError>"));
        assert!(text.contains("shader_source: PFNGLSHADERSOURCEPROC"));
    }
}
