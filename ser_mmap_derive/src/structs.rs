use proc_macro2::TokenStream;
use quote::{format_ident, quote, quote_spanned};
use syn::{spanned::Spanned, DataStruct, Fields, Ident, Index, Member, Type, Visibility};

use crate::options::Options;

struct FieldInfo {
	member: Member,
	ty: Type,
	vis: Visibility,
}

pub fn derive_struct(data: DataStruct, vis: Visibility, ident: Ident, options: Options) -> TokenStream {
	let mapped_ident = options
		.name
		.clone()
		.unwrap_or_else(|| format_ident!("Mapped{}", ident));

	let fields: Vec<FieldInfo> = data
		.fields
		.iter()
		.enumerate()
		.map(|(index, field)| FieldInfo {
			member: match &field.ident {
				Some(name) => Member::Named(name.clone()),
				None => Member::Unnamed(Index::from(index)),
			},
			ty: field.ty.clone(),
			vis: field.vis.clone(),
		})
		.collect();

	let mapped_struct = get_mapped_struct(&data.fields, &fields, &vis, &ident, &mapped_ident, &options);
	let serialize_impl = get_serialize_impl(&fields, &ident, &mapped_ident, options.pod);
	let pod_impl = if options.pod {
		get_pod_impl(&fields, &ident, &mapped_ident)
	} else {
		quote! {}
	};
	let versioned_impl = get_versioned_impl(&fields, &mapped_ident, &options);
	let from_mapped_impl = if options.no_copy {
		quote! {}
	} else {
		get_from_mapped_impl(&data.fields, &fields, &ident, &mapped_ident)
	};

	quote! {
		#mapped_struct
		#serialize_impl
		#pod_impl
		#versioned_impl
		#from_mapped_impl
	}
}

fn mapped_type(ty: &Type) -> TokenStream {
	quote_spanned! {ty.span()=> <#ty as ::ser_mmap::Serialize>::Mapped }
}

fn get_mapped_struct(
	shape: &Fields,
	fields: &[FieldInfo],
	vis: &Visibility,
	ident: &Ident,
	mapped_ident: &Ident,
	options: &Options,
) -> TokenStream {
	let doc = format!("Mapped form of [`{ident}`].");
	let derives = &options.derives;
	let derive_attr = if derives.is_empty() {
		quote! {}
	} else {
		quote! { #[derive(#(#derives),*)] }
	};

	let field_defs = fields.iter().map(|field| {
		let field_vis = &field.vis;
		let ty = mapped_type(&field.ty);
		match &field.member {
			Member::Named(name) => quote! { #field_vis #name: #ty },
			Member::Unnamed(_) => quote! { #field_vis #ty },
		}
	});

	let body = match shape {
		Fields::Named(_) => quote! { { #(#field_defs,)* } },
		Fields::Unnamed(_) => quote! { ( #(#field_defs,)* ); },
		Fields::Unit => quote! { ; },
	};

	quote! {
		#[doc = #doc]
		#[repr(C)]
		#derive_attr
		#vis struct #mapped_ident #body
	}
}

fn get_serialize_impl(fields: &[FieldInfo], ident: &Ident, mapped_ident: &Ident, pod: bool) -> TokenStream {
	let data_stmts = fields.iter().map(|field| {
		let member = &field.member;
		quote_spanned! {field.ty.span()=>
			::ser_mmap::Serialize::write_data(&self.#member, writer, offsets)?;
		}
	});

	let field_stmts = fields.iter().map(|field| {
		let member = &field.member;
		quote_spanned! {field.ty.span()=>
			::ser_mmap::pad_to(writer, start + ::core::mem::offset_of!(#mapped_ident, #member))?;
			::ser_mmap::Serialize::write_field(&self.#member, writer, offsets)?;
		}
	});

	let pod_bytes = if pod {
		quote! {
			#[inline]
			fn pod_bytes(values: &[Self]) -> ::core::option::Option<&[u8]> {
				::core::option::Option::Some(::ser_mmap::slice_bytes(values))
			}
		}
	} else {
		quote! {}
	};

	quote! {
		#[automatically_derived]
		impl ::ser_mmap::Serialize for #ident {
			type Mapped = #mapped_ident;

			fn write_data<__W: ::ser_mmap::Writer + ?Sized>(
				&self,
				writer: &mut __W,
				offsets: &mut ::ser_mmap::Offsets,
			) -> ::ser_mmap::Result<()> {
				#(#data_stmts)*
				::ser_mmap::align(writer)
			}

			fn write_field<__W: ::ser_mmap::Writer + ?Sized>(
				&self,
				writer: &mut __W,
				offsets: &mut ::ser_mmap::Offsets,
			) -> ::ser_mmap::Result<()> {
				let start = ::ser_mmap::Writer::pos(writer);
				#(#field_stmts)*
				::ser_mmap::pad_to(writer, start + ::core::mem::size_of::<#mapped_ident>())
			}

			#pod_bytes
		}
	}
}

/// `Pod` impl for `#[mapped(pod)]`, with compile-time checks that the struct
/// has exactly the layout of its mapped form and no padding.
fn get_pod_impl(fields: &[FieldInfo], ident: &Ident, mapped_ident: &Ident) -> TokenStream {
	let field_types = fields.iter().map(|field| &field.ty);
	let mapped_types = fields.iter().map(|field| mapped_type(&field.ty));
	let offset_checks = fields.iter().map(|field| {
		let member = &field.member;
		quote! {
			&& ::core::mem::offset_of!(#ident, #member) == ::core::mem::offset_of!(#mapped_ident, #member)
		}
	});

	let layout_msg = format!("`#[mapped(pod)]` requires `{ident}` to have same layout as `{mapped_ident}`. Add `#[repr(C)]`.");
	let padding_msg = format!("`#[mapped(pod)]` requires `{mapped_ident}` to contain no padding");

	quote! {
		const _: () = {
			::core::assert!(
				::core::mem::size_of::<#ident>() == ::core::mem::size_of::<#mapped_ident>()
				#(#offset_checks)*,
				#layout_msg
			);
			::core::assert!(
				::core::mem::size_of::<#mapped_ident>() == 0 #(+ ::core::mem::size_of::<#mapped_types>())*,
				#padding_msg
			);
		};

		// SAFETY: Fields are all `Pod`, struct has same layout as its mapped form,
		// and neither has padding (checked above)
		#[automatically_derived]
		unsafe impl ::ser_mmap::Pod for #ident
		where #(#field_types: ::ser_mmap::Pod,)*
		{}
	}
}

fn get_versioned_impl(fields: &[FieldInfo], mapped_ident: &Ident, options: &Options) -> TokenStream {
	let field_types = fields.iter().map(|field| mapped_type(&field.ty));

	let format_version = options.version.as_ref().map(|version| {
		quote! {
			fn format_version(
				_: &mut ::ser_mmap::Versions,
			) -> ::core::option::Option<::ser_mmap::FormatVersion> {
				::core::option::Option::Some(#version)
			}
		}
	});

	let enforce_version = options.enforce_version.as_ref().map(|version| {
		quote! {
			fn enforce_version(
				_: &mut ::ser_mmap::Versions,
			) -> ::core::option::Option<::ser_mmap::FormatVersion> {
				::core::option::Option::Some(#version)
			}
		}
	});

	quote! {
		#[automatically_derived]
		impl ::ser_mmap::Versioned for #mapped_ident {
			#[allow(unused_variables)]
			fn field_versions(
				versions: &mut ::ser_mmap::Versions,
			) -> ::core::option::Option<::ser_mmap::FormatVersion> {
				let version: ::ser_mmap::FormatVersion = 0;
				#(
					let version = ::ser_mmap::Versions::combine(version, versions.get::<#field_types>());
				)*
				::core::option::Option::Some(version)
			}

			#format_version
			#enforce_version
		}
	}
}

fn get_from_mapped_impl(
	shape: &Fields,
	fields: &[FieldInfo],
	ident: &Ident,
	mapped_ident: &Ident,
) -> TokenStream {
	let values = fields.iter().map(|field| {
		let member = &field.member;
		let ty = &field.ty;
		quote_spanned! {ty.span()=>
			<#ty as ::ser_mmap::FromMapped>::from_mapped(&mapped.#member)
		}
	});

	let body = match shape {
		Fields::Named(_) => {
			let names = fields.iter().map(|field| &field.member);
			quote! { Self { #(#names: #values,)* } }
		}
		Fields::Unnamed(_) => quote! { Self( #(#values,)* ) },
		Fields::Unit => quote! { Self },
	};

	quote! {
		#[automatically_derived]
		impl ::ser_mmap::FromMapped for #ident {
			#[allow(unused_variables)]
			fn from_mapped(mapped: &#mapped_ident) -> Self {
				#body
			}
		}
	}
}
