use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Error, Fields, Ident, LitStr, Path, Result};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Scope {
    Global,
    Organization,
    Environment,
}

impl Scope {
    fn parse(value: &LitStr) -> Result<Self> {
        match value.value().as_str() {
            "global" => Ok(Scope::Global),
            "organization" => Ok(Scope::Organization),
            "environment" => Ok(Scope::Environment),
            other => Err(Error::new(
                value.span(),
                format!("unknown scope `{other}`, expected `global`, `organization`, or `environment`"),
            )),
        }
    }

    fn to_tokens(self) -> TokenStream2 {
        match self {
            Scope::Global => quote! { ::scopekv::tenancy::ScopeLevel::Global },
            Scope::Organization => quote! { ::scopekv::tenancy::ScopeLevel::Organization },
            Scope::Environment => quote! { ::scopekv::tenancy::ScopeLevel::Environment },
        }
    }
}

/// Kinds whose keys double as parent-scope markers (`scopekv::keys`).
/// Only the built-in `Organization` and `Environment` may own them.
const RESERVED_KINDS: &[&str] = &["organizations", "environments"];

pub(crate) struct ParsedResource {
    name: Ident,
    kind: LitStr,
    scope: Scope,
    validators: Vec<Path>,
    name_field: Ident,
    organization_field: Option<Ident>,
    environment_field: Option<Ident>,
}

impl ParsedResource {
    pub(crate) fn from_input(input: &DeriveInput) -> Result<Self> {
        let mut kind: Option<LitStr> = None;
        let mut scope = Scope::Environment;
        let mut validators = Vec::new();

        for attr in &input.attrs {
            if attr.path().is_ident("resource") {
                Self::parse_container_attr(attr, &mut kind, &mut scope, &mut validators)?;
            }
        }

        let kind = kind.ok_or_else(|| {
            Error::new(
                input.ident.span(),
                "ConfigResource requires #[resource(kind = \"...\")] on the struct",
            )
        })?;

        let named = match &input.data {
            Data::Struct(data) => match &data.fields {
                Fields::Named(named) => named,
                _ => return Err(Error::new(input.ident.span(), "ConfigResource requires named fields")),
            },
            _ => return Err(Error::new(input.ident.span(), "ConfigResource can only be derived for structs")),
        };

        let mut name_field: Option<Ident> = None;
        let mut organization_field: Option<Ident> = None;
        let mut environment_field: Option<Ident> = None;

        for field in &named.named {
            let Some(ident) = field.ident.clone() else { continue };
            for attr in &field.attrs {
                if !attr.path().is_ident("resource") {
                    continue;
                }
                attr.parse_nested_meta(|meta| {
                    let slot = if meta.path.is_ident("name") {
                        &mut name_field
                    } else if meta.path.is_ident("organization") {
                        &mut organization_field
                    } else if meta.path.is_ident("environment") {
                        &mut environment_field
                    } else {
                        return Err(meta.error("expected `name`, `organization`, or `environment`"));
                    };
                    if slot.is_some() {
                        return Err(meta.error("marker may only appear on one field"));
                    }
                    *slot = Some(ident.clone());
                    Ok(())
                })?;
            }
        }

        let name_field = name_field.ok_or_else(|| {
            Error::new(
                input.ident.span(),
                "ConfigResource requires a field annotated with #[resource(name)]",
            )
        })?;

        match scope {
            Scope::Global => {
                if let Some(field) = organization_field.as_ref().or(environment_field.as_ref()) {
                    return Err(Error::new(
                        field.span(),
                        "global resources cannot carry #[resource(organization)] or #[resource(environment)]",
                    ));
                }
            }
            Scope::Organization => {
                if organization_field.is_none() {
                    return Err(Error::new(
                        input.ident.span(),
                        "organization-scoped resources require a #[resource(organization)] field",
                    ));
                }
                if let Some(field) = &environment_field {
                    return Err(Error::new(
                        field.span(),
                        "organization-scoped resources cannot carry #[resource(environment)]",
                    ));
                }
            }
            Scope::Environment => {
                if organization_field.is_none() || environment_field.is_none() {
                    return Err(Error::new(
                        input.ident.span(),
                        "environment-scoped resources require #[resource(organization)] and #[resource(environment)] fields",
                    ));
                }
            }
        }

        Ok(Self {
            name: input.ident.clone(),
            kind,
            scope,
            validators,
            name_field,
            organization_field,
            environment_field,
        })
    }

    fn parse_container_attr(
        attr: &Attribute,
        kind: &mut Option<LitStr>,
        scope: &mut Scope,
        validators: &mut Vec<Path>,
    ) -> Result<()> {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("kind") {
                let value: LitStr = meta.value()?.parse()?;
                if value.value().is_empty() || value.value().contains('/') {
                    return Err(Error::new(value.span(), "kind must be non-empty and must not contain `/`"));
                }
                if RESERVED_KINDS.contains(&value.value().as_str()) {
                    return Err(Error::new(
                        value.span(),
                        format!("kind `{}` is reserved for scope marker keys", value.value()),
                    ));
                }
                *kind = Some(value);
            } else if meta.path.is_ident("scope") {
                let value: LitStr = meta.value()?.parse()?;
                *scope = Scope::parse(&value)?;
            } else if meta.path.is_ident("validate") {
                let value: LitStr = meta.value()?.parse()?;
                validators.push(value.parse()?);
            } else {
                return Err(meta.error("expected `kind`, `scope`, or `validate`"));
            }
            Ok(())
        })
    }

    pub(crate) fn emit(&self) -> TokenStream2 {
        let name = &self.name;
        let kind = &self.kind;
        let scope = self.scope.to_tokens();
        let name_field = &self.name_field;

        let tenancy = match (&self.organization_field, &self.environment_field) {
            (Some(org), Some(env)) => quote! {
                ::scopekv::tenancy::TenancyContext::new(self.#org.clone(), self.#env.clone())
            },
            (Some(org), None) => quote! {
                ::scopekv::tenancy::TenancyContext::organization(self.#org.clone())
            },
            _ => quote! { ::scopekv::tenancy::TenancyContext::default() },
        };

        let custom_validators = self.validators.iter().map(|path| {
            quote! {
                if let ::std::result::Result::Err(err) = #path(self) {
                    issues.extend(err.issues);
                }
            }
        });

        quote! {
            impl ::scopekv::resources::Resource for #name {
                const KIND: &'static str = #kind;
                const SCOPE: ::scopekv::tenancy::ScopeLevel = #scope;

                fn name(&self) -> &str {
                    self.#name_field.as_str()
                }

                fn tenancy(&self) -> ::scopekv::tenancy::TenancyContext {
                    #tenancy
                }

                fn validate(&self) -> ::scopekv::errors::ValidationResult<()> {
                    let mut issues = ::scopekv::validators::identity_issues(
                        self.#name_field.as_str(),
                        &<Self as ::scopekv::resources::Resource>::tenancy(self),
                        #scope,
                    );
                    #(#custom_validators)*
                    if issues.is_empty() {
                        ::std::result::Result::Ok(())
                    } else {
                        ::std::result::Result::Err(::scopekv::errors::ValidationError::new(issues))
                    }
                }
            }
        }
    }
}
