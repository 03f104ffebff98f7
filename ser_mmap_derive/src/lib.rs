use proc_macro2::TokenStream;
use syn::{parse_macro_input, Data, DeriveInput};

mod options;
use options::get_options;
mod structs;
use structs::derive_struct;

/// Derive `Serialize` for a struct, and generate its mapped form.
///
/// For `struct Foo`, generates `#[repr(C)] struct MappedFoo` with each field of
/// type `<FieldType as Serialize>::Mapped`, plus impls of `Serialize`,
/// `Versioned` (for `MappedFoo`) and `FromMapped`.
///
/// Options, in a `#[mapped(...)]` attribute on the struct:
///
/// * `name = "Ident"`: name of mapped struct (default `Mapped` + name).
/// * `version = N`: combine `N` into format version fingerprint.
/// * `enforce_version = N`: use `N` as fingerprint, ignoring fields.
/// * `no_copy`: don't implement `FromMapped`.
/// * `pod`: implement `Pod`, so sequences of the struct are copied in bulk.
///   Struct must be `Copy` and `#[repr(C)]`, with only `Pod` fields and no
///   padding. Checked at compile time.
/// * `derive(...)`: derives to apply to mapped struct.
#[proc_macro_derive(Serialize, attributes(mapped))]
pub fn serialize(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
	let input = parse_macro_input!(input as DeriveInput);
	serialize_impl(input).into()
}

fn serialize_impl(input: DeriveInput) -> TokenStream {
	if !input.generics.params.is_empty() {
		panic!("Deriving `Serialize` on generic types not supported");
	}

	let options = get_options(&input.attrs);

	match input.data {
		Data::Struct(data) => derive_struct(data, input.vis, input.ident, options),
		Data::Enum(_) => panic!("Deriving `Serialize` on Enums not supported"),
		Data::Union(_) => panic!("Deriving `Serialize` on Unions not supported"),
	}
}
