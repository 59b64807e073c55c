use std::borrow::Cow;
use std::fmt::Write;

use glbind_registry::mapping::{apply, GO_PACKAGE_TYPES};
use glbind_registry::registry::PLATFORM_SHIM_TYPE;
use glbind_registry::{CommandSignature, EnumConstant, TypeDefinition};

use super::common::{EnumLiteral, GeneratorContext, PackageVisitor};
use super::GenerateError;

const GO_RESERVED: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "for", "func", "go", "goto", "if", "import", "interface", "map", "package", "range", "return",
    "select", "string", "struct", "switch", "type", "var",
];

fn go_identifier(name: &str) -> Cow<'_, str> {
    if GO_RESERVED.contains(&name) {
        Cow::Owned(format!("gl{name}"))
    } else {
        Cow::Borrowed(name)
    }
}

/// Appends `text` to a cgo preamble, one `// ` prefixed line per source line.
fn preamble(out: &mut String, text: &str) -> std::fmt::Result {
    for line in text.lines() {
        if line.is_empty() {
            writeln!(out, "//")?;
        } else {
            writeln!(out, "// {line}")?;
        }
    }
    Ok(())
}

/// Emits one cgo package. The preamble parts and the Go parts are collected separately and
/// stitched together in `finish`.
#[derive(Default)]
pub(super) struct GoVisitor {
    c_types: String,
    needs_khrplatform: bool,
    c_prototypes: String,
    c_bridges: String,
    constants: String,
    pointers: String,
    wrappers: String,
    loaders: String,
}

impl PackageVisitor for GoVisitor {
    fn visit_type_definition(
        &mut self,
        _ctx: &mut GeneratorContext,
        type_definition: &TypeDefinition,
    ) -> Result<(), GenerateError> {
        if type_definition.requires.as_deref() == Some(PLATFORM_SHIM_TYPE) {
            self.needs_khrplatform = true;
        }
        if !type_definition.doc_comment.is_empty() {
            preamble(&mut self.c_types, &format!("/* {} */", type_definition.doc_comment))?;
        }
        preamble(&mut self.c_types, type_definition.source_text.trim())?;
        Ok(())
    }

    fn visit_enum(
        &mut self,
        _ctx: &mut GeneratorContext,
        constant: &EnumConstant,
        literal: EnumLiteral,
    ) -> Result<(), GenerateError> {
        writeln!(self.constants, "\t{} = {}", constant.name, literal.digits)?;
        Ok(())
    }

    fn visit_command(
        &mut self,
        ctx: &mut GeneratorContext,
        command: &CommandSignature,
    ) -> Result<(), GenerateError> {
        let name = &command.name;
        let pfn = format!("P{}", command.entry_point.to_uppercase());
        let c_return = command.return_type.to_string();
        let c_params: Vec<String> = command
            .parameters
            .iter()
            .map(|p| p.type_.declare(&p.name))
            .collect();
        let c_args: Vec<&str> = command.parameters.iter().map(|p| p.name.as_str()).collect();

        preamble(
            &mut self.c_prototypes,
            &format!("typedef {c_return} (APIENTRYP {pfn})({});", c_params.join(", ")),
        )?;

        let mut bridge_params = vec![format!("{pfn} fptr")];
        bridge_params.extend(c_params);
        let result = if command.return_type.is_void() { "" } else { "return " };
        preamble(
            &mut self.c_bridges,
            &format!(
                "static {c_return} gogl{name}({}) {{\n\t{result}(*fptr)({});\n}}",
                bridge_params.join(", "),
                c_args.join(", ")
            ),
        )?;

        writeln!(self.pointers, "\tpgl{name} C.{pfn}")?;

        let mut params = Vec::new();
        let mut args = vec![format!("pgl{name}")];
        for parameter in &command.parameters {
            let ident = go_identifier(&parameter.name);
            let native = ctx.types.render(&parameter.type_).unwrap_or_default();
            let template = ctx
                .types
                .conversion_expression(&parameter.type_)
                .unwrap_or_default();
            params.push(format!("{ident} {native}"));
            args.push(apply(&template, &ident));
        }
        let call = format!("C.gogl{name}({})", args.join(", "));

        for line in ctx.doc_lines(command) {
            writeln!(self.wrappers, "// {line}")?;
        }
        if command.return_type.is_void() {
            writeln!(self.wrappers, "func {name}({}) {{", params.join(", "))?;
            writeln!(self.wrappers, "\t{call}")?;
        } else {
            let native = ctx.types.render(&command.return_type).unwrap_or_default();
            let template = ctx
                .types
                .return_conversion_expression(&command.return_type)
                .unwrap_or_default();
            writeln!(self.wrappers, "func {name}({}) {native} {{", params.join(", "))?;
            writeln!(self.wrappers, "\treturn {}", apply(&template, &call))?;
        }
        writeln!(self.wrappers, "}}")?;
        writeln!(self.wrappers)?;

        let entry_point = &command.entry_point;
        writeln!(
            self.loaders,
            "\tif pgl{name} = (C.{pfn})(getProcAddress(\"{entry_point}\")); pgl{name} == nil {{\n\t\treturn errors.New(\"{entry_point}\")\n\t}}"
        )?;
        Ok(())
    }

    fn finish(self, ctx: &GeneratorContext) -> Result<String, GenerateError> {
        let family = &ctx.package.family;
        let linkage = ctx.linkage();
        let desktop = matches!(family.as_str(), "gl" | "glx" | "wgl" | "glcore");
        let mut out = String::new();

        writeln!(
            out,
            "// Code generated by {} {}. DO NOT EDIT.\n",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        )?;
        writeln!(out, "// Package {family} binds {}.", ctx.title())?;
        writeln!(out, "package {family}\n")?;

        for (goos, flags) in linkage.ldflags {
            writeln!(out, "// #cgo {goos} LDFLAGS: {flags}")?;
        }
        writeln!(out, "//")?;

        let mut includes = String::from(
            "#define _GNU_SOURCE 1\n#include <stdlib.h>\n#if defined(_WIN32)\n#define WIN32_LEAN_AND_MEAN 1\n#include <windows.h>\n#else\n#include <dlfcn.h>\n#endif\n",
        );
        if self.needs_khrplatform {
            includes.push_str("#include <KHR/khrplatform.h>\n");
        }
        preamble(&mut out, &includes)?;
        writeln!(out, "//")?;
        preamble(
            &mut out,
            "#ifndef APIENTRY\n#define APIENTRY\n#endif\n#ifndef APIENTRYP\n#define APIENTRYP APIENTRY *\n#endif\n#ifndef GLAPI\n#define GLAPI extern\n#endif",
        )?;
        writeln!(out, "//")?;
        out.push_str(&self.c_types);
        writeln!(out, "//")?;

        let windows_library = linkage.libraries[2].1;
        let mut loader = format!(
            "#ifdef _WIN32\nstatic HMODULE library = NULL;\n#elif !defined(__APPLE__)\n{}#endif\n\nstatic void* goglGetProcAddress(const char* name) {{\n#ifdef __APPLE__\n\treturn dlsym(RTLD_DEFAULT, name);\n#elif _WIN32\n",
            if desktop {
                "extern void (*glXGetProcAddress(const unsigned char* name))(void);\n"
            } else {
                ""
            }
        );
        if desktop {
            loader.push_str("\tvoid* pf = wglGetProcAddress((LPCSTR)name);\n\tif(pf) {\n\t\treturn pf;\n\t}\n");
        }
        write!(
            loader,
            "\tif(library == NULL) {{\n\t\tlibrary = LoadLibraryA(\"{windows_library}\");\n\t}}\n\treturn GetProcAddress(library, (LPCSTR)name);\n#else\n"
        )?;
        if desktop {
            loader.push_str("\treturn (void*)glXGetProcAddress((const unsigned char*)name);\n");
        } else {
            loader.push_str("\treturn dlsym(RTLD_DEFAULT, name);\n");
        }
        loader.push_str("#endif\n}");
        preamble(&mut out, &loader)?;
        writeln!(out, "//")?;

        out.push_str(&self.c_prototypes);
        writeln!(out, "//")?;
        out.push_str(&self.c_bridges);
        writeln!(out, "import \"C\"\n")?;

        let runtime = ctx.options.go_runtime;
        let uses_runtime = self.wrappers.contains("glt.");
        writeln!(out, "import (")?;
        if !self.loaders.is_empty() {
            writeln!(out, "\t\"errors\"")?;
        }
        writeln!(out, "\t\"unsafe\"")?;
        if uses_runtime {
            writeln!(out, "\n\t\"{runtime}\"")?;
        }
        writeln!(out, ")\n")?;

        writeln!(out, "type (")?;
        for (name, underlying) in GO_PACKAGE_TYPES {
            writeln!(out, "\t{name} {underlying}")?;
        }
        writeln!(out, ")\n")?;

        if !self.constants.is_empty() {
            writeln!(out, "const (\n{})\n", self.constants)?;
        }
        if !self.pointers.is_empty() {
            writeln!(out, "var (\n{})\n", self.pointers)?;
        }
        out.push_str(&self.wrappers);

        if self.wrappers.contains("glBool(") {
            writeln!(
                out,
                "func glBool(b bool) C.GLboolean {{\n\tif b {{\n\t\treturn 1\n\t}}\n\treturn 0\n}}\n"
            )?;
        }
        if self.wrappers.contains("goBool(") {
            writeln!(out, "func goBool(b C.GLboolean) bool {{\n\treturn b != 0\n}}\n")?;
        }
        writeln!(
            out,
            "func getProcAddress(name string) unsafe.Pointer {{\n\tcname := C.CString(name)\n\tdefer C.free(unsafe.Pointer(cname))\n\treturn C.goglGetProcAddress(cname)\n}}\n"
        )?;

        writeln!(
            out,
            "// Init resolves every entry point. It fails with the name of the first missing one."
        )?;
        writeln!(out, "func Init() error {{\n{}\treturn nil\n}}", self.loaders)?;
        Ok(out)
    }
}
