use syn::{Attribute, Ident, Lit, LitInt, Meta, MetaList, NestedMeta, Path};

/// Options from `#[mapped(...)]` attributes.
#[derive(Default)]
pub struct Options {
	pub name: Option<Ident>,
	pub version: Option<LitInt>,
	pub enforce_version: Option<LitInt>,
	pub no_copy: bool,
	pub pod: bool,
	pub derives: Vec<Path>,
}

pub fn get_options(attrs: &[Attribute]) -> Options {
	let mut options = Options::default();

	for attr in attrs {
		if !attr.path.is_ident("mapped") {
			continue;
		}

		let nested = match attr.parse_meta() {
			Ok(Meta::List(MetaList { nested, .. })) => nested,
			_ => panic!("`#[mapped]` needs a list of options e.g. `#[mapped(version = 2)]`"),
		};

		for item in nested {
			match item {
				NestedMeta::Meta(Meta::NameValue(name_value)) => {
					let path = &name_value.path;
					if path.is_ident("name") {
						let Lit::Str(name) = name_value.lit else {
							panic!("`#[mapped(name)]` needs a string e.g. `#[mapped(name = \"MappedFoo\")]`");
						};
						let name = name.parse::<Ident>().expect("Malformed `mapped(name)` option");
						set_once(&mut options.name, name, "name");
					} else if path.is_ident("version") {
						set_once(&mut options.version, get_int(name_value.lit, "version"), "version");
					} else if path.is_ident("enforce_version") {
						set_once(
							&mut options.enforce_version,
							get_int(name_value.lit, "enforce_version"),
							"enforce_version",
						);
					} else {
						panic!("Unknown `#[mapped]` option");
					}
				}
				NestedMeta::Meta(Meta::Path(path)) if path.is_ident("no_copy") => {
					options.no_copy = true;
				}
				NestedMeta::Meta(Meta::Path(path)) if path.is_ident("pod") => {
					options.pod = true;
				}
				NestedMeta::Meta(Meta::List(list)) if list.path.is_ident("derive") => {
					for derive in list.nested {
						match derive {
							NestedMeta::Meta(Meta::Path(path)) => options.derives.push(path),
							_ => panic!("`#[mapped(derive)]` needs paths e.g. `#[mapped(derive(Debug))]`"),
						}
					}
				}
				_ => panic!("Unknown `#[mapped]` option"),
			}
		}
	}

	options
}

fn get_int(lit: Lit, option: &str) -> LitInt {
	match lit {
		Lit::Int(int) => int,
		_ => panic!("`#[mapped({option})]` needs an integer"),
	}
}

fn set_once<T>(slot: &mut Option<T>, value: T, option: &str) {
	if slot.is_some() {
		panic!("Can only specify `#[mapped({option})]` once");
	}
	*slot = Some(value);
}
